//! Handshake signature algorithms that still accept short RSA keys.
//!
//! webpki's RSA verifiers require keys of at least 2048 bits, so a server
//! still running a 1024-bit key fails the handshake before its chain can be
//! shown. [`LEGACY_TOLERANT`] keeps the standard ECDSA and Ed25519 verifiers
//! and swaps each RSA entry for one that tries *ring* first and falls back
//! to the `rsa` crate for keys *ring* refuses.
//!
//! These only check that the peer holds the key for the leaf it sent. They
//! are never used to decide trust.

use rsa::pkcs1::DecodeRsaPublicKey;
use rsa::{Pkcs1v15Sign, Pss, RsaPublicKey};
use rustls::crypto::WebPkiSupportedAlgorithms;
use rustls::pki_types::{alg_id, AlgorithmIdentifier, InvalidSignature, SignatureVerificationAlgorithm};
use rustls::SignatureScheme;
use sha2::{Digest, Sha256, Sha384, Sha512};
use webpki::ring as webpki_algs;

#[derive(Debug, Clone, Copy)]
enum Padding {
    Pkcs1,
    Pss,
}

#[derive(Debug, Clone, Copy)]
enum Hash {
    Sha256,
    Sha384,
    Sha512,
}

/// RSA verifier accepting keys from 1024 bits.
#[derive(Debug)]
struct LegacyRsa {
    signature_alg_id: AlgorithmIdentifier,
    ring_alg: &'static dyn ring::signature::VerificationAlgorithm,
    padding: Padding,
    hash: Hash,
}

impl SignatureVerificationAlgorithm for LegacyRsa {
    fn public_key_alg_id(&self) -> AlgorithmIdentifier {
        alg_id::RSA_ENCRYPTION
    }

    fn signature_alg_id(&self) -> AlgorithmIdentifier {
        self.signature_alg_id
    }

    fn verify_signature(&self, public_key: &[u8], message: &[u8], signature: &[u8]) -> Result<(), InvalidSignature> {
        if ring::signature::UnparsedPublicKey::new(self.ring_alg, public_key)
            .verify(message, signature)
            .is_ok()
        {
            return Ok(());
        }
        verify_short_key(self.padding, self.hash, public_key, message, signature)
    }
}

/// `public_key` is the PKCS#1 `RSAPublicKey` from the certificate's SPKI.
fn verify_short_key(
    padding: Padding,
    hash: Hash,
    public_key: &[u8],
    message: &[u8],
    signature: &[u8],
) -> Result<(), InvalidSignature> {
    let key = RsaPublicKey::from_pkcs1_der(public_key).map_err(|_| InvalidSignature)?;
    let result = match (padding, hash) {
        (Padding::Pkcs1, Hash::Sha256) => key.verify(Pkcs1v15Sign::new::<Sha256>(), &Sha256::digest(message), signature),
        (Padding::Pkcs1, Hash::Sha384) => key.verify(Pkcs1v15Sign::new::<Sha384>(), &Sha384::digest(message), signature),
        (Padding::Pkcs1, Hash::Sha512) => key.verify(Pkcs1v15Sign::new::<Sha512>(), &Sha512::digest(message), signature),
        (Padding::Pss, Hash::Sha256) => key.verify(Pss::new::<Sha256>(), &Sha256::digest(message), signature),
        (Padding::Pss, Hash::Sha384) => key.verify(Pss::new::<Sha384>(), &Sha384::digest(message), signature),
        (Padding::Pss, Hash::Sha512) => key.verify(Pss::new::<Sha512>(), &Sha512::digest(message), signature),
    };
    result.map_err(|_| InvalidSignature)
}

static RSA_PKCS1_SHA256: &dyn SignatureVerificationAlgorithm = &LegacyRsa {
    signature_alg_id: alg_id::RSA_PKCS1_SHA256,
    ring_alg: &ring::signature::RSA_PKCS1_1024_8192_SHA256_FOR_LEGACY_USE_ONLY,
    padding: Padding::Pkcs1,
    hash: Hash::Sha256,
};

static RSA_PKCS1_SHA384: &dyn SignatureVerificationAlgorithm = &LegacyRsa {
    signature_alg_id: alg_id::RSA_PKCS1_SHA384,
    ring_alg: &ring::signature::RSA_PKCS1_2048_8192_SHA384,
    padding: Padding::Pkcs1,
    hash: Hash::Sha384,
};

static RSA_PKCS1_SHA512: &dyn SignatureVerificationAlgorithm = &LegacyRsa {
    signature_alg_id: alg_id::RSA_PKCS1_SHA512,
    ring_alg: &ring::signature::RSA_PKCS1_1024_8192_SHA512_FOR_LEGACY_USE_ONLY,
    padding: Padding::Pkcs1,
    hash: Hash::Sha512,
};

static RSA_PSS_SHA256: &dyn SignatureVerificationAlgorithm = &LegacyRsa {
    signature_alg_id: alg_id::RSA_PSS_SHA256,
    ring_alg: &ring::signature::RSA_PSS_2048_8192_SHA256,
    padding: Padding::Pss,
    hash: Hash::Sha256,
};

static RSA_PSS_SHA384: &dyn SignatureVerificationAlgorithm = &LegacyRsa {
    signature_alg_id: alg_id::RSA_PSS_SHA384,
    ring_alg: &ring::signature::RSA_PSS_2048_8192_SHA384,
    padding: Padding::Pss,
    hash: Hash::Sha384,
};

static RSA_PSS_SHA512: &dyn SignatureVerificationAlgorithm = &LegacyRsa {
    signature_alg_id: alg_id::RSA_PSS_SHA512,
    ring_alg: &ring::signature::RSA_PSS_2048_8192_SHA512,
    padding: Padding::Pss,
    hash: Hash::Sha512,
};

/// Handshake signature verifiers used while capturing.
///
/// Each RSA scheme maps to a single verifier: TLS 1.3 only tries the first
/// algorithm for a scheme, and TLS 1.2 stops at the first that rejects.
pub static LEGACY_TOLERANT: WebPkiSupportedAlgorithms = WebPkiSupportedAlgorithms {
    all: &[
        webpki_algs::ECDSA_P256_SHA256,
        webpki_algs::ECDSA_P256_SHA384,
        webpki_algs::ECDSA_P384_SHA256,
        webpki_algs::ECDSA_P384_SHA384,
        webpki_algs::ED25519,
        RSA_PSS_SHA256,
        RSA_PSS_SHA384,
        RSA_PSS_SHA512,
        RSA_PKCS1_SHA256,
        RSA_PKCS1_SHA384,
        RSA_PKCS1_SHA512,
    ],
    mapping: &[
        (
            SignatureScheme::ECDSA_NISTP384_SHA384,
            &[webpki_algs::ECDSA_P384_SHA384, webpki_algs::ECDSA_P256_SHA384],
        ),
        (
            SignatureScheme::ECDSA_NISTP256_SHA256,
            &[webpki_algs::ECDSA_P256_SHA256, webpki_algs::ECDSA_P384_SHA256],
        ),
        (SignatureScheme::ED25519, &[webpki_algs::ED25519]),
        (SignatureScheme::RSA_PSS_SHA512, &[RSA_PSS_SHA512]),
        (SignatureScheme::RSA_PSS_SHA384, &[RSA_PSS_SHA384]),
        (SignatureScheme::RSA_PSS_SHA256, &[RSA_PSS_SHA256]),
        (SignatureScheme::RSA_PKCS1_SHA512, &[RSA_PKCS1_SHA512]),
        (SignatureScheme::RSA_PKCS1_SHA384, &[RSA_PKCS1_SHA384]),
        (SignatureScheme::RSA_PKCS1_SHA256, &[RSA_PKCS1_SHA256]),
    ],
};

#[cfg(test)]
mod tests {
    use super::*;
    use rustls::pki_types::CertificateDer;

    const MESSAGE: &[u8] = include_bytes!("../testdata/message.bin");
    const LEGACY_CERT: &[u8] = include_bytes!("../testdata/legacy-rsa1024.der");
    const MODERN_CERT: &[u8] = include_bytes!("../testdata/rsa2048.der");

    fn first_alg(scheme: SignatureScheme) -> &'static dyn SignatureVerificationAlgorithm {
        LEGACY_TOLERANT
            .mapping
            .iter()
            .find(|(s, _)| *s == scheme)
            .map(|(_, algs)| algs[0])
            .unwrap()
    }

    /// Checks `signature` the way rustls does: through webpki's end-entity cert.
    fn verify(cert: &[u8], scheme: SignatureScheme, signature: &[u8]) -> bool {
        let der = CertificateDer::from(cert);
        let ee = webpki::EndEntityCert::try_from(&der).unwrap();
        ee.verify_signature(first_alg(scheme), MESSAGE, signature).is_ok()
    }

    #[test]
    fn test_rsa_1024_pss_accepted() {
        let sig = include_bytes!("../testdata/legacy-rsa1024-pss-sha256.sig");
        assert!(verify(LEGACY_CERT, SignatureScheme::RSA_PSS_SHA256, sig));
    }

    #[test]
    fn test_rsa_1024_pkcs1_accepted() {
        let sig256 = include_bytes!("../testdata/legacy-rsa1024-pkcs1-sha256.sig");
        let sig384 = include_bytes!("../testdata/legacy-rsa1024-pkcs1-sha384.sig");
        assert!(verify(LEGACY_CERT, SignatureScheme::RSA_PKCS1_SHA256, sig256));
        assert!(verify(LEGACY_CERT, SignatureScheme::RSA_PKCS1_SHA384, sig384));
    }

    #[test]
    fn test_rsa_2048_pss_accepted() {
        let sig = include_bytes!("../testdata/rsa2048-pss-sha256.sig");
        assert!(verify(MODERN_CERT, SignatureScheme::RSA_PSS_SHA256, sig));
    }

    #[test]
    fn test_wrong_key_or_tampered_signature_rejected() {
        let sig = include_bytes!("../testdata/legacy-rsa1024-pss-sha256.sig");
        assert!(!verify(MODERN_CERT, SignatureScheme::RSA_PSS_SHA256, sig));

        let mut tampered = sig.to_vec();
        tampered[10] ^= 0x01;
        assert!(!verify(LEGACY_CERT, SignatureScheme::RSA_PSS_SHA256, &tampered));
    }

    #[test]
    fn test_padding_is_not_interchangeable() {
        let pss = include_bytes!("../testdata/legacy-rsa1024-pss-sha256.sig");
        assert!(!verify(LEGACY_CERT, SignatureScheme::RSA_PKCS1_SHA256, pss));
    }

    #[test]
    fn test_every_tls13_scheme_is_mapped() {
        for scheme in [
            SignatureScheme::ECDSA_NISTP256_SHA256,
            SignatureScheme::ECDSA_NISTP384_SHA384,
            SignatureScheme::ED25519,
            SignatureScheme::RSA_PSS_SHA256,
            SignatureScheme::RSA_PSS_SHA384,
            SignatureScheme::RSA_PSS_SHA512,
        ] {
            assert!(LEGACY_TOLERANT.supported_schemes().contains(&scheme), "{scheme:?}");
        }
    }
}
