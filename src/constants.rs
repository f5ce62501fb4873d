//! Global constants for the coreuploader application.
//!
//! This module centralizes all hardcoded values to improve maintainability
//! and make sizing changes easier.

// Buffer size constants
/// Read buffer used when pulling from the upload source (32KB)
pub const UPLOAD_BUFFER_SIZE: usize = 32 * 1024;

/// Buffer used for each read of the HTTP response (512 bytes)
pub const RESPONSE_BUFFER_SIZE: usize = 512;

/// Largest plaintext payload a single TLS record can carry (16KB)
pub const MAX_PLAINTEXT_RECORD: usize = 16 * 1024;

// Network constants
/// Port used for every HTTPS upload target
pub const HTTPS_PORT: u16 = 443;

// HTTP constants
/// Content type announced for uploaded objects
pub const CONTENT_TYPE: &str = "application/octet-stream";

/// Zero-length chunk plus the empty trailer section
pub const CHUNKED_TERMINATOR: &[u8] = b"0\r\n\r\n";

/// Line terminator used in request framing
pub const CRLF: &[u8] = b"\r\n";

// Target constants
/// Host serving the Google Cloud Storage JSON upload API
pub const GCP_UPLOAD_HOST: &str = "www.googleapis.com";
