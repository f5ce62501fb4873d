use std::io::{self, Read};

use log::{debug, warn};
use sha2::{Digest, Sha256};

use crate::constants::{CHUNKED_TERMINATOR, CRLF, UPLOAD_BUFFER_SIZE};
use crate::error::SessionError;
use crate::net::RawStream;
use crate::tls::TlsSession;

/// Destination for encoded body bytes. Writes are all-or-error.
pub trait BodySink {
    fn send_all(&mut self, buf: &[u8]) -> Result<(), SessionError>;
}

impl<S: RawStream> BodySink for TlsSession<S> {
    fn send_all(&mut self, buf: &[u8]) -> Result<(), SessionError> {
        self.write_all_plaintext(buf)
    }
}

impl BodySink for Vec<u8> {
    fn send_all(&mut self, buf: &[u8]) -> Result<(), SessionError> {
        self.extend_from_slice(buf);
        Ok(())
    }
}

/// What the encoder sent for one body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodyStats {
    pub chunks: u64,
    pub payload_bytes: u64,
    /// Hex SHA-256 of the payload (not the framing)
    pub sha256: String,
}

/// Streams a source of unknown length as an HTTP chunked body.
///
/// Each non-empty read from the source becomes one chunk; no chunk
/// extensions or trailers are produced. End of input, or a source read
/// failure, ends the body with the zero-length terminator.
pub struct ChunkedEncoder {
    buffer: Vec<u8>,
}

impl Default for ChunkedEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ChunkedEncoder {
    pub fn new() -> Self {
        Self::with_capacity(UPLOAD_BUFFER_SIZE)
    }

    /// Encoder whose chunks carry at most `capacity` bytes
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: vec![0u8; capacity.max(1)],
        }
    }

    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Encode all of `source` into `sink`, finishing with the terminator.
    ///
    /// Sink failures abort immediately and are returned as-is; the
    /// terminator is not sent in that case.
    pub fn encode<R, W>(&mut self, source: &mut R, sink: &mut W) -> Result<BodyStats, SessionError>
    where
        R: Read + ?Sized,
        W: BodySink + ?Sized,
    {
        let mut hasher = Sha256::new();
        let mut chunks = 0u64;
        let mut payload_bytes = 0u64;

        loop {
            let n = match read_source(source, &mut self.buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) => {
                    warn!("Reading upload source failed, ending body early: {}", e);
                    break;
                }
            };

            let data = &self.buffer[..n];
            sink.send_all(chunk_header(n).as_bytes())?;
            sink.send_all(data)?;
            sink.send_all(CRLF)?;

            hasher.update(data);
            chunks += 1;
            payload_bytes += n as u64;
        }

        sink.send_all(CHUNKED_TERMINATOR)?;

        let stats = BodyStats {
            chunks,
            payload_bytes,
            sha256: format!("{:x}", hasher.finalize()),
        };
        debug!(
            "Encoded {} bytes in {} chunks (sha256 {})",
            stats.payload_bytes, stats.chunks, stats.sha256
        );
        Ok(stats)
    }
}

/// Size line for a chunk of `len` bytes: lowercase hex, then CRLF.
pub fn chunk_header(len: usize) -> String {
    format!("{:x}\r\n", len)
}

fn read_source<R: Read + ?Sized>(source: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    loop {
        match source.read(buf) {
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            other => return other,
        }
    }
}
