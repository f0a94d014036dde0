//! Certificate fingerprints for manual verification.
//!
//! SHA-256 is the fingerprint operators should compare. SHA-1 and MD5 are
//! printed only so the output lines up with older tooling (`keytool`,
//! browser dialogs); neither is collision-resistant, so never treat a match
//! on them alone as proof of identity.

use md5::{Digest, Md5};
use ring::digest::{digest as ring_digest, SHA1_FOR_LEGACY_USE_ONLY, SHA256};

use crate::types::{Certificate, Validity};

/// Digests of a certificate's DER encoding, lowercase hex.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fingerprints {
    /// SHA-256 (primary)
    pub sha256: String,
    /// SHA-1 (legacy, display only)
    pub sha1: String,
    /// MD5 (legacy, display only)
    pub md5: String,
}

impl Fingerprints {
    /// Compute all fingerprints of raw DER bytes.
    #[must_use]
    pub fn of_der(der: &[u8]) -> Self {
        Self {
            sha256: hex::encode(ring_digest(&SHA256, der)),
            sha1: hex::encode(ring_digest(&SHA1_FOR_LEGACY_USE_ONLY, der)),
            md5: hex::encode(Md5::digest(der)),
        }
    }

    /// The strong hash.
    #[must_use]
    pub fn primary(&self) -> &str {
        &self.sha256
    }
}

/// Compute the fingerprints of a certificate.
#[must_use]
pub fn digest(cert: &Certificate) -> Fingerprints {
    Fingerprints::of_der(cert.der())
}

/// Format lowercase hex as colon-separated uppercase pairs (`AB:CD:...`).
#[must_use]
pub fn colon_hex(hex: &str) -> String {
    let upper = hex.to_ascii_uppercase();
    let mut out = String::with_capacity(upper.len() + upper.len() / 2);
    for (i, pair) in upper.as_bytes().chunks(2).enumerate() {
        if i > 0 {
            out.push(':');
        }
        out.push_str(&String::from_utf8_lossy(pair));
    }
    out
}

/// Everything shown to the operator about one certificate in a chain.
#[derive(Debug, Clone)]
pub struct CertificateSummary {
    /// Position in the chain (0 = leaf)
    pub index: usize,
    /// Subject DN
    pub subject: String,
    /// Issuer DN
    pub issuer: String,
    /// Serial number
    pub serial: String,
    /// Validity start
    pub not_before: chrono::DateTime<chrono::Utc>,
    /// Validity end
    pub not_after: chrono::DateTime<chrono::Utc>,
    /// Validity relative to when the summary was made
    pub validity: Validity,
    /// Subject and issuer are the same name
    pub self_issued: bool,
    /// Digests
    pub fingerprints: Fingerprints,
}

impl CertificateSummary {
    /// Summarize the certificate at `index`, judging validity as of now.
    #[must_use]
    pub fn new(index: usize, cert: &Certificate) -> Self {
        Self::at(index, cert, chrono::Utc::now())
    }

    /// Summarize the certificate at `index`, judging validity as of `now`.
    #[must_use]
    pub fn at(index: usize, cert: &Certificate, now: chrono::DateTime<chrono::Utc>) -> Self {
        Self {
            index,
            subject: cert.subject().to_string(),
            issuer: cert.issuer().to_string(),
            serial: cert.serial().to_string(),
            not_before: cert.not_before(),
            not_after: cert.not_after(),
            validity: cert.validity_at(now),
            self_issued: cert.is_self_issued(),
            fingerprints: digest(cert),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cert(cn: &str) -> Certificate {
        let params = rcgen::CertificateParams::new(vec![cn.to_string()]).unwrap();
        let key = rcgen::KeyPair::generate().unwrap();
        Certificate::from_der(params.self_signed(&key).unwrap().der().to_vec()).unwrap()
    }

    #[test]
    fn test_known_vectors() {
        let fp = Fingerprints::of_der(b"hello world");
        assert_eq!(
            fp.sha256,
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
        assert_eq!(fp.sha1, "2aae6c35c94fcfb415dbe95f408b9ce91ee846ed");
        assert_eq!(fp.md5, "5eb63bbbe01eeed093cb22bb8f5acdc3");
    }

    #[test]
    fn test_digest_is_deterministic() {
        let c = cert("a.test");
        assert_eq!(digest(&c), digest(&c));
    }

    #[test]
    fn test_different_certs_differ() {
        let a = digest(&cert("a.test"));
        let b = digest(&cert("b.test"));
        assert_ne!(a.primary(), b.primary());
    }

    #[test]
    fn test_colon_hex() {
        assert_eq!(colon_hex("0a1bff"), "0A:1B:FF");
        assert_eq!(colon_hex(""), "");
    }

    #[test]
    fn test_summary_fields() {
        let c = cert("summary.test");
        let s = CertificateSummary::new(3, &c);
        assert_eq!(s.index, 3);
        assert_eq!(s.subject, c.subject());
        assert_eq!(s.fingerprints.sha256.len(), 64);
        assert_eq!(s.fingerprints.sha1.len(), 40);
        assert_eq!(s.fingerprints.md5.len(), 32);
        assert_eq!(s.validity, Validity::Valid);
        assert!(s.self_issued);
    }

    #[test]
    fn test_summary_validity_as_of() {
        let c = cert("window.test");
        let early = c.not_before() - chrono::Duration::days(1);
        let late = c.not_after() + chrono::Duration::days(1);
        assert_eq!(CertificateSummary::at(0, &c, early).validity, Validity::NotYetValid);
        assert_eq!(CertificateSummary::at(0, &c, late).validity, Validity::Expired);
    }
}
