use std::io;
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};

use log::{debug, warn};

use crate::error::UploadError;

/// Resolve `host` and return its addresses with IPv4 entries first.
pub fn resolve(host: &str, port: u16) -> Result<Vec<SocketAddr>, UploadError> {
    let mut addrs: Vec<SocketAddr> = (host, port)
        .to_socket_addrs()
        .map_err(|source| UploadError::Resolution {
            host: host.to_string(),
            source,
        })?
        .collect();

    if addrs.is_empty() {
        return Err(UploadError::Resolution {
            host: host.to_string(),
            source: io::Error::new(io::ErrorKind::NotFound, "no addresses returned"),
        });
    }

    // Stable sort keeps resolver order within each family
    addrs.sort_by_key(|addr| !addr.is_ipv4());
    Ok(addrs)
}

/// Open a blocking TCP connection to `host:port`.
///
/// Addresses are tried in order; the error from the last attempt is reported
/// if none of them accept the connection.
pub fn connect(host: &str, port: u16) -> Result<TcpStream, UploadError> {
    let addrs = resolve(host, port)?;
    let mut last_error = None;

    for addr in addrs {
        debug!("Connecting to {} ({})", host, addr);
        match TcpStream::connect(addr) {
            Ok(stream) => {
                debug!("Connected to {}", addr);
                return Ok(stream);
            }
            Err(e) => {
                warn!("Connection to {} failed: {}", addr, e);
                last_error = Some(e);
            }
        }
    }

    Err(UploadError::Connection {
        host: host.to_string(),
        port,
        source: last_error.unwrap_or_else(|| io::Error::from(io::ErrorKind::NotConnected)),
    })
}
