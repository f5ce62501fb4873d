//! Error types shared by the TLS session and the upload orchestrator.

use std::fmt;
use std::io;

use openssl::error::ErrorStack;
use thiserror::Error;

/// Failures reported by a [`TlsSession`](crate::tls::TlsSession).
#[derive(Debug, Error)]
pub enum SessionError {
    /// The TLS context could not be built (bad anchors, OpenSSL setup failure)
    #[error("TLS setup failed")]
    Setup(#[from] ErrorStack),

    /// The trust anchor bundle held no certificates
    #[error("no trust anchors configured")]
    NoTrustAnchors,

    /// Handshake or certificate validation failed
    #[error("TLS handshake with {host} failed: {reason}")]
    Handshake { host: String, reason: String },

    /// A record was malformed or rejected after the handshake completed
    #[error("TLS record layer failure: {0}")]
    Record(String),

    /// The underlying byte stream failed
    #[error("stream I/O failure")]
    Io(#[from] io::Error),

    /// The session already failed or was closed
    #[error("TLS session is not established")]
    NotEstablished,
}

/// The point of the upload at which a failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Handshake,
    Headers,
    Body,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Handshake => "establishing the session",
            Stage::Headers => "sending request headers",
            Stage::Body => "streaming request body",
        };
        f.write_str(name)
    }
}

/// Every fatal condition the uploader can report.
#[derive(Debug, Error)]
pub enum UploadError {
    /// Missing or invalid parameters, detected before any network activity
    #[error("{0}")]
    Configuration(String),

    #[error("Unable to resolve {host}")]
    Resolution {
        host: String,
        #[source]
        source: io::Error,
    },

    #[error("Unable to connect to {host}:{port}")]
    Connection {
        host: String,
        port: u16,
        #[source]
        source: io::Error,
    },

    #[error("TLS failure while {stage}")]
    Tls {
        stage: Stage,
        #[source]
        source: SessionError,
    },

    #[error("I/O failure while {stage}")]
    Io {
        stage: Stage,
        #[source]
        source: io::Error,
    },
}

impl UploadError {
    /// Classify a session failure that happened during `stage`.
    ///
    /// Transport failures surfacing through the TLS layer are reported as
    /// I/O errors; everything else is a TLS error.
    pub fn at(stage: Stage, err: SessionError) -> Self {
        match err {
            SessionError::Io(source) => UploadError::Io { stage, source },
            source => UploadError::Tls { stage, source },
        }
    }

    /// True for errors that happen before the process touches the network.
    pub fn is_configuration(&self) -> bool {
        matches!(self, UploadError::Configuration(_))
    }
}
