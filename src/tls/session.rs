use std::mem;

use log::{debug, warn};
use openssl::ssl::{
    ErrorCode, HandshakeError, Ssl, SslConnector, SslMethod, SslStream, SslVerifyMode, SslVersion,
};
use openssl::x509::X509VerifyResult;

use crate::constants::MAX_PLAINTEXT_RECORD;
use crate::error::SessionError;
use crate::net::{RawStream, StreamAdapter, Transfer};
use crate::tls::anchors::TrustAnchors;

/// Client-side TLS settings shared by every session.
///
/// Peers are verified against the supplied anchors only; the platform's
/// default roots are never consulted and no client certificate is sent.
pub struct TlsClientConfig {
    connector: SslConnector,
}

impl TlsClientConfig {
    pub fn initialize(anchors: &TrustAnchors) -> Result<Self, SessionError> {
        let mut builder = SslConnector::builder(SslMethod::tls_client())?;
        builder.set_cert_store(anchors.to_store()?);
        builder.set_verify(SslVerifyMode::PEER);
        builder.set_min_proto_version(Some(SslVersion::TLS1_2))?;

        debug!("TLS client configured with {} trust anchors", anchors.len());
        Ok(Self {
            connector: builder.build(),
        })
    }
}

/// Lifecycle of a [`TlsSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakePhase {
    NotStarted,
    Handshaking,
    Established,
    Closed,
    Failed,
}

enum Channel<S> {
    Idle(Ssl, StreamAdapter<S>),
    Open(SslStream<StreamAdapter<S>>),
    Gone,
}

/// A client TLS session layered on a [`StreamAdapter`].
///
/// Outbound plaintext is coalesced into record-sized batches and only pushed
/// to the stream when a batch fills, on `flush`, or before a read. Every
/// failure is terminal: the session moves to [`HandshakePhase::Failed`] and
/// later operations return [`SessionError::NotEstablished`].
pub struct TlsSession<S> {
    channel: Channel<S>,
    phase: HandshakePhase,
    host: String,
    pending: Vec<u8>,
}

impl<S: RawStream> TlsSession<S> {
    /// Prepare a session for `expected_host` over an already-connected stream.
    ///
    /// `expected_host` is sent as SNI and is the only name the server
    /// certificate is checked against. No bytes are exchanged until the
    /// handshake runs.
    pub fn new(config: &TlsClientConfig, expected_host: &str, raw: S) -> Result<Self, SessionError> {
        let ssl = config.connector.configure()?.into_ssl(expected_host)?;

        Ok(Self {
            channel: Channel::Idle(ssl, StreamAdapter::new(raw)),
            phase: HandshakePhase::NotStarted,
            host: expected_host.to_string(),
            pending: Vec::with_capacity(MAX_PLAINTEXT_RECORD),
        })
    }

    /// Create a session and complete the handshake before returning it.
    pub fn establish(config: &TlsClientConfig, expected_host: &str, raw: S) -> Result<Self, SessionError> {
        let mut session = Self::new(config, expected_host, raw)?;
        session.handshake()?;
        Ok(session)
    }

    pub fn phase(&self) -> HandshakePhase {
        self.phase
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// Negotiated protocol version, once established.
    pub fn protocol_version(&self) -> Option<&'static str> {
        match &self.channel {
            Channel::Open(stream) => Some(stream.ssl().version_str()),
            _ => None,
        }
    }

    /// Run the handshake if it has not happened yet.
    pub fn handshake(&mut self) -> Result<(), SessionError> {
        match self.phase {
            HandshakePhase::NotStarted => {}
            HandshakePhase::Established => return Ok(()),
            _ => return Err(SessionError::NotEstablished),
        }

        let (ssl, adapter) = match mem::replace(&mut self.channel, Channel::Gone) {
            Channel::Idle(ssl, adapter) => (ssl, adapter),
            other => {
                self.channel = other;
                return Err(SessionError::NotEstablished);
            }
        };

        self.phase = HandshakePhase::Handshaking;
        debug!("Starting TLS handshake with {}", self.host);

        match ssl.connect(adapter) {
            Ok(stream) => {
                debug!(
                    "TLS established with {} using {} ({})",
                    self.host,
                    stream.ssl().version_str(),
                    stream
                        .ssl()
                        .current_cipher()
                        .map(|c| c.name())
                        .unwrap_or("unknown cipher")
                );
                self.channel = Channel::Open(stream);
                self.phase = HandshakePhase::Established;
                Ok(())
            }
            Err(HandshakeError::SetupFailure(e)) => {
                self.phase = HandshakePhase::Failed;
                Err(SessionError::Setup(e))
            }
            Err(HandshakeError::Failure(mid)) | Err(HandshakeError::WouldBlock(mid)) => {
                self.phase = HandshakePhase::Failed;
                let verify = mid.ssl().verify_result();
                let reason = if verify != X509VerifyResult::OK {
                    verify.error_string().to_string()
                } else {
                    mid.error().to_string()
                };
                Err(SessionError::Handshake {
                    host: self.host.clone(),
                    reason,
                })
            }
        }
    }

    /// Encrypt and send all of `buf`, or fail.
    ///
    /// Bytes may sit in the outbound batch until the next `flush` or read.
    pub fn write_all_plaintext(&mut self, buf: &[u8]) -> Result<(), SessionError> {
        self.ensure_established()?;

        if self.pending.len() + buf.len() <= MAX_PLAINTEXT_RECORD {
            self.pending.extend_from_slice(buf);
            return Ok(());
        }

        self.flush_pending()?;
        if buf.len() >= MAX_PLAINTEXT_RECORD {
            let result = self.write_records(buf);
            return self.record_result(result);
        }

        self.pending.extend_from_slice(buf);
        Ok(())
    }

    /// Push every buffered record onto the stream.
    pub fn flush(&mut self) -> Result<(), SessionError> {
        self.ensure_established()?;
        self.flush_pending()
    }

    /// Read decrypted application data, blocking until some arrives.
    ///
    /// Pending output is flushed first. Returns [`Transfer::Closed`] once the
    /// peer has closed the session or the transport.
    pub fn read_plaintext(&mut self, buf: &mut [u8]) -> Result<Transfer, SessionError> {
        if self.phase == HandshakePhase::Closed {
            return Ok(Transfer::Closed);
        }
        self.ensure_established()?;
        self.flush_pending()?;

        if buf.is_empty() {
            return Ok(Transfer::Bytes(0));
        }

        let stream = match &mut self.channel {
            Channel::Open(stream) => stream,
            _ => return Err(SessionError::NotEstablished),
        };

        loop {
            match stream.ssl_read(buf) {
                Ok(n) => return Ok(Transfer::Bytes(n)),
                Err(e) if e.code() == ErrorCode::ZERO_RETURN => {
                    debug!("{} sent close_notify", self.host);
                    self.phase = HandshakePhase::Closed;
                    return Ok(Transfer::Closed);
                }
                Err(e) if e.code() == ErrorCode::SYSCALL && e.io_error().is_none() => {
                    debug!("{} closed the connection", self.host);
                    self.phase = HandshakePhase::Closed;
                    return Ok(Transfer::Closed);
                }
                Err(e) if e.code() == ErrorCode::WANT_READ && e.io_error().is_none() => {}
                Err(e) => {
                    self.phase = HandshakePhase::Failed;
                    return Err(record_failure(e));
                }
            }
        }
    }

    /// Flush, send close_notify, and mark the session closed.
    ///
    /// Failures here are logged and otherwise ignored.
    pub fn close(&mut self) {
        if self.phase == HandshakePhase::Established {
            if let Err(e) = self.flush_pending() {
                warn!("Failed to flush TLS session to {} on close: {}", self.host, e);
            }
        }
        if let Channel::Open(stream) = &mut self.channel {
            if self.phase == HandshakePhase::Established {
                if let Err(e) = stream.shutdown() {
                    debug!("TLS shutdown with {} failed: {}", self.host, e);
                }
            }
        }
        if self.phase != HandshakePhase::Failed {
            self.phase = HandshakePhase::Closed;
        }
    }

    fn ensure_established(&mut self) -> Result<(), SessionError> {
        match self.phase {
            HandshakePhase::Established => Ok(()),
            HandshakePhase::NotStarted => self.handshake(),
            _ => Err(SessionError::NotEstablished),
        }
    }

    fn flush_pending(&mut self) -> Result<(), SessionError> {
        if self.pending.is_empty() {
            return Ok(());
        }
        let pending = mem::take(&mut self.pending);
        let result = self.write_records(&pending);
        self.pending = pending;
        self.pending.clear();
        self.record_result(result)
    }

    fn write_records(&mut self, mut data: &[u8]) -> Result<(), SessionError> {
        let stream = match &mut self.channel {
            Channel::Open(stream) => stream,
            _ => return Err(SessionError::NotEstablished),
        };

        while !data.is_empty() {
            match stream.ssl_write(data) {
                Ok(n) => data = &data[n..],
                Err(e)
                    if matches!(e.code(), ErrorCode::WANT_READ | ErrorCode::WANT_WRITE)
                        && e.io_error().is_none() => {}
                Err(e) => return Err(record_failure(e)),
            }
        }
        Ok(())
    }

    fn record_result(&mut self, result: Result<(), SessionError>) -> Result<(), SessionError> {
        if result.is_err() {
            self.phase = HandshakePhase::Failed;
        }
        result
    }
}

fn record_failure(err: openssl::ssl::Error) -> SessionError {
    match err.into_io_error() {
        Ok(io) => SessionError::Io(io),
        Err(err) => SessionError::Record(err.to_string()),
    }
}
