//! Server certificate verifier that records instead of enforcing.
//!
//! [`CapturingVerifier`] wraps the evaluator rustls would normally use
//! (webpki, seeded from the trust store) and intercepts exactly one
//! decision: the server chain check always passes, and the chain is kept
//! for the caller. Handshake signatures are still checked, against
//! [`LEGACY_TOLERANT`], so the peer must prove it holds the key for the leaf
//! it sent even when that key is too short for webpki.
//!
//! Only ever use this to *look at* a chain. A connection made with it has
//! no authentication.

use std::sync::{Arc, Mutex};

use installcert_core::Certificate;
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::client::WebPkiServerVerifier;
use rustls::crypto::{verify_tls12_signature, verify_tls13_signature, CryptoProvider};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{CertificateError, DigitallySignedStruct, Error, RootCertStore, SignatureScheme};
use tracing::{debug, warn};

use crate::algorithms::LEGACY_TOLERANT;

/// What the wrapped evaluator would have said about the chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrustVerdict {
    /// The chain validates against the store
    Trusted,
    /// The chain would have been rejected, with the reason
    Untrusted(String),
}

impl TrustVerdict {
    /// Returns true for `Trusted`.
    #[must_use]
    pub const fn is_trusted(&self) -> bool {
        matches!(self, Self::Trusted)
    }
}

/// Chain and verdict recorded during a handshake.
#[derive(Debug, Clone)]
pub struct Recorded {
    /// Leaf first, as sent by the peer
    pub chain: Vec<CertificateDer<'static>>,
    /// Wrapped evaluator's opinion
    pub verdict: TrustVerdict,
}

/// Permissive decorator over the store-seeded server verifier.
#[derive(Debug)]
pub struct CapturingVerifier {
    inner: Arc<dyn ServerCertVerifier>,
    accepted_issuers: Vec<String>,
    recorded: Mutex<Option<Recorded>>,
}

impl CapturingVerifier {
    /// Build a verifier whose wrapped evaluator trusts `anchors`.
    pub fn new<'a>(
        anchors: impl IntoIterator<Item = &'a Certificate>,
        provider: &Arc<CryptoProvider>,
    ) -> Self {
        let mut roots = RootCertStore::empty();
        let mut accepted_issuers = Vec::new();
        let ders = anchors.into_iter().map(|cert| {
            accepted_issuers.push(cert.subject().to_string());
            CertificateDer::from(cert.der().to_vec())
        });
        let (added, ignored) = roots.add_parsable_certificates(ders);
        debug!(added, ignored, "seeded trust anchors from key store");

        let inner: Arc<dyn ServerCertVerifier> =
            match WebPkiServerVerifier::builder_with_provider(Arc::new(roots), provider.clone()).build() {
                Ok(verifier) => verifier,
                Err(e) => {
                    debug!(error = %e, "no usable trust anchors, every chain will be untrusted");
                    Arc::new(NoAnchors)
                }
            };

        Self::wrap(inner, accepted_issuers)
    }

    /// Wrap an arbitrary evaluator.
    pub fn wrap(inner: Arc<dyn ServerCertVerifier>, accepted_issuers: Vec<String>) -> Self {
        Self {
            inner,
            accepted_issuers,
            recorded: Mutex::new(None),
        }
    }

    /// Subjects of the certificates the wrapped evaluator trusts.
    #[must_use]
    pub fn accepted_issuers(&self) -> &[String] {
        &self.accepted_issuers
    }

    /// Take the recorded chain, if the server chain check ran.
    pub fn take(&self) -> Option<Recorded> {
        self.recorded.lock().ok()?.take()
    }
}

impl ServerCertVerifier for CapturingVerifier {
    fn verify_server_cert(
        &self,
        end_entity: &CertificateDer<'_>,
        intermediates: &[CertificateDer<'_>],
        server_name: &ServerName<'_>,
        ocsp_response: &[u8],
        now: UnixTime,
    ) -> Result<ServerCertVerified, Error> {
        let verdict = match self
            .inner
            .verify_server_cert(end_entity, intermediates, server_name, ocsp_response, now)
        {
            Ok(_) => TrustVerdict::Trusted,
            Err(e) => TrustVerdict::Untrusted(e.to_string()),
        };
        debug!(?verdict, certs = intermediates.len() + 1, "recorded server chain");

        let chain = std::iter::once(end_entity)
            .chain(intermediates)
            .map(|c| c.clone().into_owned())
            .collect();

        match self.recorded.lock() {
            Ok(mut slot) => *slot = Some(Recorded { chain, verdict }),
            Err(_) => {
                warn!("capture slot poisoned");
                return Err(Error::General("certificate capture failed".into()));
            }
        }

        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, Error> {
        verify_tls12_signature(message, cert, dss, &LEGACY_TOLERANT)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, Error> {
        verify_tls13_signature(message, cert, dss, &LEGACY_TOLERANT)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        LEGACY_TOLERANT.supported_schemes()
    }
}

/// Stand-in evaluator for an empty store: trusts nothing.
#[derive(Debug)]
struct NoAnchors;

impl ServerCertVerifier for NoAnchors {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, Error> {
        Err(Error::InvalidCertificate(CertificateError::UnknownIssuer))
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, Error> {
        verify_tls12_signature(message, cert, dss, &LEGACY_TOLERANT)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, Error> {
        verify_tls13_signature(message, cert, dss, &LEGACY_TOLERANT)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        LEGACY_TOLERANT.supported_schemes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> Arc<CryptoProvider> {
        Arc::new(rustls::crypto::ring::default_provider())
    }

    fn self_signed(name: &str) -> (Certificate, CertificateDer<'static>) {
        let params = rcgen::CertificateParams::new(vec![name.to_string()]).unwrap();
        let key = rcgen::KeyPair::generate().unwrap();
        let der = params.self_signed(&key).unwrap().der().to_vec();
        (Certificate::from_der(der.clone()).unwrap(), CertificateDer::from(der))
    }

    #[test]
    fn test_nothing_recorded_before_handshake() {
        let v = CapturingVerifier::new(std::iter::empty(), &provider());
        assert!(v.take().is_none());
        assert!(v.accepted_issuers().is_empty());
    }

    #[test]
    fn test_untrusted_chain_is_accepted_and_recorded() {
        let (_, der) = self_signed("untrusted.test");
        let v = CapturingVerifier::new(std::iter::empty(), &provider());
        let name = ServerName::try_from("untrusted.test").unwrap();

        v.verify_server_cert(&der, &[], &name, &[], UnixTime::now())
            .expect("capture must never reject");

        let rec = v.take().unwrap();
        assert_eq!(rec.chain, vec![der]);
        assert!(!rec.verdict.is_trusted());
        assert!(v.take().is_none(), "take empties the slot");
    }

    #[test]
    fn test_anchored_chain_is_trusted() {
        let (cert, der) = self_signed("anchored.test");
        let v = CapturingVerifier::new([&cert], &provider());
        assert_eq!(v.accepted_issuers(), &[cert.subject().to_string()]);
        let name = ServerName::try_from("anchored.test").unwrap();

        v.verify_server_cert(&der, &[], &name, &[], UnixTime::now())
            .unwrap();
        assert_eq!(v.take().unwrap().verdict, TrustVerdict::Trusted);
    }

    #[test]
    fn test_intermediates_follow_leaf() {
        let (_, leaf) = self_signed("leaf.test");
        let (_, mid) = self_signed("mid.test");
        let v = CapturingVerifier::new(std::iter::empty(), &provider());
        let name = ServerName::try_from("leaf.test").unwrap();

        v.verify_server_cert(&leaf, std::slice::from_ref(&mid), &name, &[], UnixTime::now())
            .unwrap();
        assert_eq!(v.take().unwrap().chain, vec![leaf, mid]);
    }
}
