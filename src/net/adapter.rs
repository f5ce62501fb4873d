use std::io::{self, Read, Write};
use std::net::TcpStream;

use log::debug;

/// The raw, interruption-prone read/write primitive of a connected stream.
///
/// Implementations make a single attempt per call and report exactly what the
/// operating system returned; retrying is the adapter's job.
#[cfg_attr(test, mockall::automock)]
pub trait RawStream {
    /// Read at most `buf.len()` bytes. `Ok(0)` means the peer closed the stream.
    fn raw_read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Write at most `buf.len()` bytes, returning how many were accepted.
    fn raw_write(&mut self, buf: &[u8]) -> io::Result<usize>;
}

impl RawStream for TcpStream {
    fn raw_read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Read::read(self, buf)
    }

    fn raw_write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Write::write(self, buf)
    }
}

#[cfg(unix)]
impl RawStream for std::os::unix::net::UnixStream {
    fn raw_read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Read::read(self, buf)
    }

    fn raw_write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Write::write(self, buf)
    }
}

/// Result of a single adapter transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transfer {
    /// This many bytes were moved
    Bytes(usize),
    /// The peer closed its side of the stream
    Closed,
}

/// Bridges a [`RawStream`] to the blocking `Read`/`Write` contract the TLS
/// engine pulls from and pushes to.
///
/// Signal interruptions are retried with the same arguments; no buffering or
/// framing happens here.
pub struct StreamAdapter<S> {
    inner: S,
}

impl<S: RawStream> StreamAdapter<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    pub fn get_ref(&self) -> &S {
        &self.inner
    }

    pub fn get_mut(&mut self) -> &mut S {
        &mut self.inner
    }

    pub fn into_inner(self) -> S {
        self.inner
    }

    /// Read into `buf`, blocking until data arrives, the peer closes, or a
    /// non-interruption error occurs.
    pub fn pull(&mut self, buf: &mut [u8]) -> io::Result<Transfer> {
        if buf.is_empty() {
            return Ok(Transfer::Bytes(0));
        }

        loop {
            match self.inner.raw_read(buf) {
                Ok(0) => return Ok(Transfer::Closed),
                Ok(n) => return Ok(Transfer::Bytes(n)),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {
                    debug!("Stream read interrupted, retrying");
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Write from `buf`, returning how many bytes the stream accepted.
    ///
    /// A stream that accepts nothing is reported as `WriteZero`.
    pub fn push(&mut self, buf: &[u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        loop {
            match self.inner.raw_write(buf) {
                Ok(0) => {
                    return Err(io::Error::new(
                        io::ErrorKind::WriteZero,
                        "stream accepted no bytes",
                    ))
                }
                Ok(n) => return Ok(n),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {
                    debug!("Stream write interrupted, retrying");
                }
                Err(e) => return Err(e),
            }
        }
    }
}

impl<S: RawStream> Read for StreamAdapter<S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.pull(buf)? {
            Transfer::Bytes(n) => Ok(n),
            Transfer::Closed => Ok(0),
        }
    }
}

impl<S: RawStream> Write for StreamAdapter<S> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.push(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Stop `SIGPIPE` from terminating the process.
///
/// Writes to a stream whose peer has gone away then fail with `EPIPE` and are
/// reported like any other I/O error.
#[cfg(unix)]
pub fn ignore_broken_pipe() {
    unsafe {
        libc::signal(libc::SIGPIPE, libc::SIG_IGN);
    }
}

#[cfg(not(unix))]
pub fn ignore_broken_pipe() {}
