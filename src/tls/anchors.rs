use openssl::error::ErrorStack;
use openssl::nid::Nid;
use openssl::x509::store::{X509Store, X509StoreBuilder};
use openssl::x509::X509;

use crate::error::SessionError;

/// Root certificates accepted for the upload hosts, embedded at build time.
///
/// GTS Root R1-R4 anchor Google's serving chains; the GlobalSign roots cover
/// the cross-signed paths still presented by some frontends.
static COMPILED_IN_PEM: &str = include_str!("../../certs/trust_anchors.pem");

/// Immutable, ordered set of root certificates used for chain validation.
#[derive(Clone)]
pub struct TrustAnchors {
    certs: Vec<X509>,
}

impl TrustAnchors {
    /// The anchor set compiled into the binary.
    pub fn compiled_in() -> Result<Self, SessionError> {
        Self::from_pem(COMPILED_IN_PEM.as_bytes())
    }

    /// Parse a concatenated PEM bundle, keeping certificate order.
    pub fn from_pem(pem: &[u8]) -> Result<Self, SessionError> {
        let certs = X509::stack_from_pem(pem)?;
        Self::from_certs(certs)
    }

    pub fn from_certs(certs: Vec<X509>) -> Result<Self, SessionError> {
        if certs.is_empty() {
            return Err(SessionError::NoTrustAnchors);
        }
        Ok(Self { certs })
    }

    pub fn len(&self) -> usize {
        self.certs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.certs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &X509> {
        self.certs.iter()
    }

    /// Common names of the anchors, in order. Anchors without a CN are skipped.
    pub fn subjects(&self) -> Vec<String> {
        self.certs
            .iter()
            .filter_map(|cert| {
                cert.subject_name()
                    .entries_by_nid(Nid::COMMONNAME)
                    .next()
                    .and_then(|entry| entry.data().as_utf8().ok())
                    .map(|cn| cn.to_string())
            })
            .collect()
    }

    /// Build a verification store holding only these anchors.
    pub fn to_store(&self) -> Result<X509Store, ErrorStack> {
        let mut builder = X509StoreBuilder::new()?;
        for cert in &self.certs {
            builder.add_cert(cert.clone())?;
        }
        Ok(builder.build())
    }
}
