//! Test utilities for coreuploader
//!
//! This module provides common testing utilities, helpers, and mocks
//! for use across all test modules.

#![cfg(test)]

use anyhow::Result;
use tempfile::NamedTempFile;

/// Creates a temporary file with the given content
pub fn create_temp_file(content: &[u8]) -> Result<NamedTempFile> {
    let mut file = NamedTempFile::new()?;
    use std::io::Write;
    file.write_all(content)?;
    file.flush()?;
    Ok(file)
}

/// Scripted byte sources
pub mod sources {
    use std::collections::VecDeque;
    use std::io::{self, Read};

    /// One scripted outcome of a `read` call
    #[derive(Debug, Clone)]
    pub enum Step {
        Data(Vec<u8>),
        Interrupted,
        Fail(io::ErrorKind),
    }

    /// A reader that replays a fixed script of bursts and failures.
    ///
    /// A `Data` step larger than the caller's buffer is split across calls.
    /// Once the script is exhausted every read returns `Ok(0)`.
    pub struct ScriptedReader {
        steps: VecDeque<Step>,
        pub reads: usize,
    }

    impl ScriptedReader {
        pub fn new(steps: Vec<Step>) -> Self {
            Self {
                steps: steps.into(),
                reads: 0,
            }
        }

        /// A reader yielding each burst as a separate read
        pub fn bursts(bursts: &[Vec<u8>]) -> Self {
            Self::new(bursts.iter().cloned().map(Step::Data).collect())
        }
    }

    impl Read for ScriptedReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.reads += 1;
            match self.steps.pop_front() {
                None => Ok(0),
                Some(Step::Interrupted) => Err(io::Error::from(io::ErrorKind::Interrupted)),
                Some(Step::Fail(kind)) => Err(io::Error::from(kind)),
                Some(Step::Data(mut data)) => {
                    let n = data.len().min(buf.len());
                    buf[..n].copy_from_slice(&data[..n]);
                    if n < data.len() {
                        self.steps.push_front(Step::Data(data.split_off(n)));
                    }
                    Ok(n)
                }
            }
        }
    }
}

/// Strict chunked transfer decoding for assertions
pub mod chunked {
    /// Decode a complete chunked body, returning the payload and chunk count.
    ///
    /// Fails on malformed framing or on bytes after the terminator.
    pub fn decode(wire: &[u8]) -> Result<(Vec<u8>, usize), String> {
        let mut payload = Vec::new();
        let mut chunks = 0;
        let mut rest = wire;

        loop {
            let line_end = rest
                .windows(2)
                .position(|w| w == b"\r\n")
                .ok_or("missing chunk size line")?;
            let size_text = std::str::from_utf8(&rest[..line_end]).map_err(|e| e.to_string())?;
            let size = usize::from_str_radix(size_text, 16)
                .map_err(|e| format!("bad chunk size {:?}: {}", size_text, e))?;
            rest = &rest[line_end + 2..];

            if size == 0 {
                return if rest == b"\r\n" {
                    Ok((payload, chunks))
                } else {
                    Err(format!("unexpected bytes after terminator: {:?}", rest))
                };
            }

            if rest.len() < size + 2 {
                return Err("truncated chunk".to_string());
            }
            if &rest[size..size + 2] != b"\r\n" {
                return Err("chunk data not followed by CRLF".to_string());
            }
            payload.extend_from_slice(&rest[..size]);
            chunks += 1;
            rest = &rest[size + 2..];
        }
    }
}

/// Throwaway PKI and an in-process TLS peer
pub mod tls {
    use std::net::{TcpListener, TcpStream};
    use std::thread::{self, JoinHandle};

    use openssl::asn1::{Asn1Integer, Asn1Time};
    use openssl::bn::{BigNum, MsbOption};
    use openssl::ec::{EcGroup, EcKey};
    use openssl::hash::MessageDigest;
    use openssl::nid::Nid;
    use openssl::pkey::{PKey, Private};
    use openssl::ssl::{SslAcceptor, SslMethod, SslStream};
    use openssl::x509::extension::{
        BasicConstraints, ExtendedKeyUsage, KeyUsage, SubjectAlternativeName,
    };
    use openssl::x509::{X509Builder, X509Name, X509NameBuilder, X509Ref, X509};

    /// A private CA and a server certificate it issued
    pub struct TestPki {
        pub ca_cert: X509,
        pub leaf_cert: X509,
        pub leaf_key: PKey<Private>,
    }

    impl TestPki {
        /// Mint a CA and a leaf valid for `dns_name`
        pub fn generate(dns_name: &str) -> Self {
            let (ca_cert, ca_key) = mint_ca("coreuploader test root");
            let (leaf_cert, leaf_key) = mint_leaf(&ca_cert, &ca_key, dns_name);
            Self {
                ca_cert,
                leaf_cert,
                leaf_key,
            }
        }
    }

    fn new_key() -> PKey<Private> {
        let group = EcGroup::from_curve_name(Nid::X9_62_PRIME256V1).unwrap();
        PKey::from_ec_key(EcKey::generate(&group).unwrap()).unwrap()
    }

    fn name(common_name: &str) -> X509Name {
        let mut builder = X509NameBuilder::new().unwrap();
        builder
            .append_entry_by_nid(Nid::COMMONNAME, common_name)
            .unwrap();
        builder.build()
    }

    fn serial() -> Asn1Integer {
        let mut bn = BigNum::new().unwrap();
        bn.rand(64, MsbOption::MAYBE_ZERO, false).unwrap();
        bn.to_asn1_integer().unwrap()
    }

    fn mint_ca(common_name: &str) -> (X509, PKey<Private>) {
        let key = new_key();
        let subject = name(common_name);

        let mut builder = X509Builder::new().unwrap();
        builder.set_version(2).unwrap();
        builder.set_serial_number(&serial()).unwrap();
        builder.set_subject_name(&subject).unwrap();
        builder.set_issuer_name(&subject).unwrap();
        builder.set_pubkey(&key).unwrap();
        builder
            .set_not_before(&Asn1Time::days_from_now(0).unwrap())
            .unwrap();
        builder
            .set_not_after(&Asn1Time::days_from_now(30).unwrap())
            .unwrap();
        builder
            .append_extension(BasicConstraints::new().critical().ca().build().unwrap())
            .unwrap();
        builder
            .append_extension(
                KeyUsage::new()
                    .critical()
                    .key_cert_sign()
                    .crl_sign()
                    .build()
                    .unwrap(),
            )
            .unwrap();
        builder.sign(&key, MessageDigest::sha256()).unwrap();

        (builder.build(), key)
    }

    fn mint_leaf(ca_cert: &X509Ref, ca_key: &PKey<Private>, dns_name: &str) -> (X509, PKey<Private>) {
        let key = new_key();

        let mut builder = X509Builder::new().unwrap();
        builder.set_version(2).unwrap();
        builder.set_serial_number(&serial()).unwrap();
        builder.set_subject_name(&name(dns_name)).unwrap();
        builder.set_issuer_name(ca_cert.subject_name()).unwrap();
        builder.set_pubkey(&key).unwrap();
        builder
            .set_not_before(&Asn1Time::days_from_now(0).unwrap())
            .unwrap();
        builder
            .set_not_after(&Asn1Time::days_from_now(30).unwrap())
            .unwrap();

        let san = SubjectAlternativeName::new()
            .dns(dns_name)
            .build(&builder.x509v3_context(Some(ca_cert), None))
            .unwrap();
        builder.append_extension(san).unwrap();
        builder
            .append_extension(BasicConstraints::new().build().unwrap())
            .unwrap();
        builder
            .append_extension(ExtendedKeyUsage::new().server_auth().build().unwrap())
            .unwrap();
        builder.sign(ca_key, MessageDigest::sha256()).unwrap();

        (builder.build(), key)
    }

    /// A TLS server accepting exactly one connection on a loopback port
    pub struct TlsPeer<R> {
        pub port: u16,
        handle: JoinHandle<Result<R, String>>,
    }

    impl<R> TlsPeer<R> {
        /// Wait for the peer; `Err` carries the server-side handshake failure
        pub fn join(self) -> Result<R, String> {
            self.handle.join().expect("TLS peer thread panicked")
        }
    }

    /// Serve one TLS connection with `pki`'s leaf, handing it to `handler`
    pub fn spawn_tls_peer<R, F>(pki: &TestPki, handler: F) -> TlsPeer<R>
    where
        R: Send + 'static,
        F: FnOnce(SslStream<TcpStream>) -> R + Send + 'static,
    {
        let mut builder = SslAcceptor::mozilla_intermediate_v5(SslMethod::tls()).unwrap();
        builder.set_private_key(&pki.leaf_key).unwrap();
        builder.set_certificate(&pki.leaf_cert).unwrap();
        builder.check_private_key().unwrap();
        let acceptor = builder.build();

        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let handle = thread::spawn(move || {
            let (tcp, _) = listener.accept().map_err(|e| e.to_string())?;
            let stream = acceptor.accept(tcp).map_err(|e| e.to_string())?;
            Ok(handler(stream))
        });

        TlsPeer { port, handle }
    }
}

#[cfg(test)]
mod tests {
    use super::chunked::decode;
    use super::sources::{ScriptedReader, Step};
    use std::io::Read;

    #[test]
    fn test_scripted_reader_splits_large_steps() {
        let mut reader = ScriptedReader::new(vec![
            Step::Data(b"abcdef".to_vec()),
            Step::Interrupted,
            Step::Data(b"g".to_vec()),
        ]);
        let mut buf = [0u8; 4];

        assert_eq!(reader.read(&mut buf).unwrap(), 4);
        assert_eq!(&buf, b"abcd");
        assert_eq!(reader.read(&mut buf).unwrap(), 2);
        assert_eq!(&buf[..2], b"ef");
        assert!(reader.read(&mut buf).is_err());
        assert_eq!(reader.read(&mut buf).unwrap(), 1);
        assert_eq!(reader.read(&mut buf).unwrap(), 0);
        assert_eq!(reader.reads, 5);
    }

    #[test]
    fn test_decode_rejects_bad_framing() {
        assert_eq!(decode(b"3\r\nabc\r\n0\r\n\r\n").unwrap(), (b"abc".to_vec(), 1));
        assert!(decode(b"3\r\nabcd\r\n0\r\n\r\n").is_err());
        assert!(decode(b"0\r\n\r\nextra").is_err());
        assert!(decode(b"zz\r\n").is_err());
        assert!(decode(b"").is_err());
    }
}
