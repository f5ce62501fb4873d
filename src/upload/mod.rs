//! Chunked HTTP upload over a TLS session.
//!
//! The [`Uploader`] sends the request line and headers, streams the source
//! through the [`ChunkedEncoder`], and reads back the first line of the
//! response. Nothing is retried: any failure before the response aborts the
//! upload and is reported to the caller.
//!
//! ## Flow
//!
//! ```text
//! source ──▶ ChunkedEncoder ──▶ TlsSession ──▶ StreamAdapter ──▶ network
//!                                   │
//!   log ◀── Uploader ◀──────────────┘ (first response line)
//! ```
//!
//! ## Usage Example
//!
//! ```no_run
//! use coreuploader::tls::TrustAnchors;
//! use coreuploader::upload::{run_upload, RequestDescriptor};
//!
//! # fn example() -> anyhow::Result<()> {
//! let request = RequestDescriptor::new(
//!     "www.googleapis.com",
//!     "/upload/storage/v1/b/crash-dumps/o?uploadType=media&name=core.1234",
//!     "core.1234",
//! );
//! let anchors = TrustAnchors::compiled_in()?;
//!
//! let report = run_upload(&request, &anchors, &mut std::io::stdin())?;
//! println!("{:?}", report.status_line);
//! # Ok(())
//! # }
//! ```

use std::io::Read;

use crate::error::{Stage, UploadError};
use crate::net::{self, RawStream};
use crate::tls::{TlsClientConfig, TlsSession, TrustAnchors};

/// Chunked transfer encoding of the request body
pub mod chunked;

/// Request/response state machine
pub mod orchestrator;

/// Request target and header rendering
pub mod request;

pub use chunked::{BodySink, BodyStats, ChunkedEncoder};
pub use orchestrator::{UploadChannel, UploadReport, UploadState, Uploader};
pub use request::RequestDescriptor;

/// Upload `source` to `request`, connecting and authenticating first.
///
/// The TLS context is built before any network activity so a bad anchor set
/// fails without connecting.
pub fn run_upload<R>(
    request: &RequestDescriptor,
    anchors: &TrustAnchors,
    source: &mut R,
) -> Result<UploadReport, UploadError>
where
    R: Read + ?Sized,
{
    net::ignore_broken_pipe();

    let tls = TlsClientConfig::initialize(anchors).map_err(|e| UploadError::at(Stage::Handshake, e))?;
    let tcp = net::connect(&request.host, request.port)?;
    upload_over(tcp, request, &tls, source)
}

/// Upload over an already-connected stream.
///
/// The handshake completes before any request bytes are written.
pub fn upload_over<S, R>(
    raw: S,
    request: &RequestDescriptor,
    tls: &TlsClientConfig,
    source: &mut R,
) -> Result<UploadReport, UploadError>
where
    S: RawStream,
    R: Read + ?Sized,
{
    let session = TlsSession::establish(tls, &request.host, raw)
        .map_err(|e| UploadError::at(Stage::Handshake, e))?;
    Uploader::new(session).run(request, source)
}
