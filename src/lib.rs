//! # coreuploader
//!
//! Streams a crash dump (or any byte source of unknown length) to cloud object
//! storage over TLS, as a chunked HTTP/1.0 `POST`.
//!
//! ## Overview
//!
//! The payload is never buffered whole: it is read in 32 KiB slices, each
//! slice framed as one HTTP chunk and written through the TLS session as it
//! arrives. A pipe from the kernel's core dump handler works as well as a
//! regular file. Nothing is retried; any failure aborts the upload and the
//! process exits non-zero.
//!
//! The server is authenticated against a small set of root certificates
//! compiled into the binary. The system trust store is never consulted.
//!
//! ## Usage
//!
//! ```no_run
//! use coreuploader::config::UploadConfig;
//! use coreuploader::tls::TrustAnchors;
//! use coreuploader::upload::run_upload;
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = UploadConfig {
//!     system: Some("gcp".to_string()),
//!     bucket: Some("crash-dumps".to_string()),
//!     filename: Some("core.1234".to_string()),
//!     input: None,
//! };
//! let plan = config.validate()?;
//! let mut source = plan.input.open()?;
//!
//! let report = run_upload(&plan.request, &TrustAnchors::compiled_in()?, &mut source)?;
//! println!("{:?}", report.status_line);
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Organization
//!
//! - [`cli`]: Command-line interface definitions
//! - [`config`]: Config file loading, validation, and storage targets
//! - [`net`]: Raw stream adapter and TCP connection setup
//! - [`tls`]: Trust anchors and the client TLS session
//! - [`upload`]: Chunked body encoding and the request/response exchange
//! - [`error`]: Error taxonomy
//! - [`constants`]: Application-wide constants

/// Command-line interface definitions and argument parsing
pub mod cli;

/// Configuration loading and storage targets
pub mod config;

/// Application constants and configuration values
pub mod constants;

/// Session and upload error types
pub mod error;

/// Byte-stream adapter and connection setup
pub mod net;

/// TLS client session
pub mod tls;

/// Chunked upload over TLS
pub mod upload;

/// Test utilities and helpers
#[cfg(test)]
pub mod test_utils;
