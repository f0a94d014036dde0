//! Ordered certificate chain as presented during a handshake.

use super::Certificate;
use crate::alias::alias_for;

/// Leaf-first sequence of certificates. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateChain {
    certs: Vec<Certificate>,
}

impl CertificateChain {
    /// Build a chain, returning `None` if `certs` is empty.
    #[must_use]
    pub fn new(certs: Vec<Certificate>) -> Option<Self> {
        if certs.is_empty() {
            None
        } else {
            Some(Self { certs })
        }
    }

    /// The peer's own certificate.
    #[must_use]
    pub fn leaf(&self) -> &Certificate {
        &self.certs[0]
    }

    /// Number of certificates (always at least one).
    #[must_use]
    pub fn len(&self) -> usize {
        self.certs.len()
    }

    /// Always false; present for API symmetry with collections.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.certs.is_empty()
    }

    /// Iterate leaf-first.
    pub fn iter(&self) -> std::slice::Iter<'_, Certificate> {
        self.certs.iter()
    }

    /// Pair each certificate with the alias it would be stored under for `host`.
    pub fn aliased<'a>(&'a self, host: &'a str) -> impl Iterator<Item = (String, &'a Certificate)> + 'a {
        self.certs
            .iter()
            .enumerate()
            .map(move |(i, cert)| (alias_for(host, i), cert))
    }
}

impl<'a> IntoIterator for &'a CertificateChain {
    type Item = &'a Certificate;
    type IntoIter = std::slice::Iter<'a, Certificate>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
