//! TLS client layer.
//!
//! A [`TlsSession`] wraps a [`StreamAdapter`](crate::net::StreamAdapter) and
//! exposes an ordered plaintext channel to the upload host. Certificates are
//! validated against a fixed, compiled-in [`TrustAnchors`] set and the
//! expected host name; revocation is not checked.
//!
//! ```no_run
//! use std::net::TcpStream;
//! use coreuploader::tls::{TlsClientConfig, TlsSession, TrustAnchors};
//!
//! # fn example() -> anyhow::Result<()> {
//! let anchors = TrustAnchors::compiled_in()?;
//! let config = TlsClientConfig::initialize(&anchors)?;
//! let tcp = TcpStream::connect(("www.googleapis.com", 443))?;
//!
//! let mut session = TlsSession::establish(&config, "www.googleapis.com", tcp)?;
//! session.write_all_plaintext(b"HEAD / HTTP/1.0\r\n\r\n")?;
//! session.flush()?;
//! # Ok(())
//! # }
//! ```

/// Compiled-in root certificates
pub mod anchors;

/// Client session state machine over a stream adapter
pub mod session;

pub use anchors::TrustAnchors;
pub use session::{HandshakePhase, TlsClientConfig, TlsSession};
