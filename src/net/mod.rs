//! Network plumbing below the TLS layer.
//!
//! The adapter turns a raw connected stream into the blocking `Read`/`Write`
//! contract the TLS engine drives, and `connect` produces that stream.

/// Interruption-absorbing bridge between a raw stream and the TLS engine
pub mod adapter;

/// Name resolution and TCP connection establishment
pub mod connect;

pub use adapter::{ignore_broken_pipe, RawStream, StreamAdapter, Transfer};
pub use connect::connect;
