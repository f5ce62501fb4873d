use std::io::Read;

use log::{debug, info, warn};

use crate::constants::RESPONSE_BUFFER_SIZE;
use crate::error::{SessionError, Stage, UploadError};
use crate::net::{RawStream, Transfer};
use crate::tls::TlsSession;
use crate::upload::chunked::{BodySink, BodyStats, ChunkedEncoder};
use crate::upload::request::RequestDescriptor;

/// A connected, authenticated channel an upload runs over.
///
/// Implemented by [`TlsSession`]; tests substitute scripted channels.
pub trait UploadChannel: BodySink {
    /// Push everything written so far onto the wire
    fn flush(&mut self) -> Result<(), SessionError>;

    /// Read response bytes, blocking until some arrive or the peer closes
    fn receive(&mut self, buf: &mut [u8]) -> Result<Transfer, SessionError>;

    /// Release the connection; failures are not reported
    fn close(&mut self);
}

impl<S: RawStream> UploadChannel for TlsSession<S> {
    fn flush(&mut self) -> Result<(), SessionError> {
        TlsSession::flush(self)
    }

    fn receive(&mut self, buf: &mut [u8]) -> Result<Transfer, SessionError> {
        self.read_plaintext(buf)
    }

    fn close(&mut self) {
        TlsSession::close(self)
    }
}

/// Progress of a single upload exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadState {
    Connected,
    RequestSent,
    BodySent,
    ResponseLine1Read,
    Drained,
    Closed,
    Aborted,
}

/// Outcome of a completed exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReport {
    /// First line of the response, without its line terminator
    pub status_line: Option<String>,
    pub body: BodyStats,
    /// Total response bytes read, including the status line
    pub response_bytes: u64,
}

/// Drives one request/response exchange over an [`UploadChannel`].
pub struct Uploader<C> {
    channel: C,
    encoder: ChunkedEncoder,
    state: UploadState,
}

impl<C: UploadChannel> Uploader<C> {
    pub fn new(channel: C) -> Self {
        Self::with_encoder(channel, ChunkedEncoder::new())
    }

    pub fn with_encoder(channel: C, encoder: ChunkedEncoder) -> Self {
        Self {
            channel,
            encoder,
            state: UploadState::Connected,
        }
    }

    pub fn state(&self) -> UploadState {
        self.state
    }

    pub fn into_channel(self) -> C {
        self.channel
    }

    /// Send `request` with `source` as its body and read back the response.
    ///
    /// Any failure before the response moves the uploader to
    /// [`UploadState::Aborted`]. Failures while reading the response only end
    /// the exchange.
    pub fn run<R>(&mut self, request: &RequestDescriptor, source: &mut R) -> Result<UploadReport, UploadError>
    where
        R: Read + ?Sized,
    {
        if self.state != UploadState::Connected {
            return Err(UploadError::Configuration(
                "an uploader can only run once".to_string(),
            ));
        }

        let result = self.exchange(request, source);
        if result.is_err() {
            self.state = UploadState::Aborted;
            self.channel.close();
        }
        result
    }

    fn exchange<R>(&mut self, request: &RequestDescriptor, source: &mut R) -> Result<UploadReport, UploadError>
    where
        R: Read + ?Sized,
    {
        let head = request.head();
        self.channel
            .send_all(head.as_bytes())
            .and_then(|_| self.channel.flush())
            .map_err(|e| UploadError::at(Stage::Headers, e))?;
        debug!("Sent request headers for {}", request.path);
        self.state = UploadState::RequestSent;

        let body = self
            .encoder
            .encode(source, &mut self.channel)
            .and_then(|stats| self.channel.flush().map(|_| stats))
            .map_err(|e| UploadError::at(Stage::Body, e))?;
        self.state = UploadState::BodySent;

        let (status_line, response_bytes) = self.drain_response();
        self.channel.close();
        self.state = UploadState::Closed;

        match &status_line {
            Some(line) => info!("Uploaded core {} -- {}", request.object_name, line),
            None => warn!(
                "Uploaded core {} -- {} closed without a response",
                request.object_name, request.host
            ),
        }
        debug!(
            "Upload of {} sent {} bytes in {} chunks (sha256 {}), read {} response bytes",
            request.object_name, body.payload_bytes, body.chunks, body.sha256, response_bytes
        );

        Ok(UploadReport {
            status_line,
            body,
            response_bytes,
        })
    }

    /// Capture the first line of the response and discard the rest.
    fn drain_response(&mut self) -> (Option<String>, u64) {
        let mut buf = [0u8; RESPONSE_BUFFER_SIZE];
        let mut status_line = None;
        let mut total = 0u64;

        loop {
            match self.channel.receive(&mut buf) {
                Ok(Transfer::Bytes(0)) | Ok(Transfer::Closed) => break,
                Ok(Transfer::Bytes(n)) => {
                    total += n as u64;
                    if status_line.is_none() {
                        status_line = Some(first_line(&buf[..n]));
                        self.state = UploadState::ResponseLine1Read;
                    }
                }
                Err(e) => {
                    debug!("Response stream ended: {}", e);
                    break;
                }
            }
        }

        self.state = UploadState::Drained;
        (status_line, total)
    }
}

/// Text before the first CR or LF, decoded lossily.
pub fn first_line(bytes: &[u8]) -> String {
    let end = bytes
        .iter()
        .position(|&b| b == b'\r' || b == b'\n')
        .unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}
