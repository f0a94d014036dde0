//! PKCS#12 key store codec, the JDK's default store type since 9.
//!
//! Trusted certificates map to certificate bags. Key bags and secrets are
//! never interpreted, only handed back unchanged on the next write.

use p12_keystore::{Certificate as P12Certificate, KeyStore, KeyStoreEntry};

use crate::error::{StoreError, StoreResult};

/// One entry as read from or written to a PKCS#12 file.
#[derive(Debug, Clone)]
pub struct P12Entry {
    pub alias: String,
    pub body: P12Body,
}

#[derive(Debug, Clone)]
pub enum P12Body {
    /// DER of a trusted certificate
    TrustedCert(Vec<u8>),
    /// Anything else, with the DER of its certificate chain if it has one
    Opaque {
        chain: Vec<Vec<u8>>,
        entry: KeyStoreEntry,
    },
}

/// Whether `data` looks like a PKCS#12 container (a DER SEQUENCE).
pub fn sniff(data: &[u8]) -> bool {
    data.first() == Some(&0x30)
}

/// Decode a PKCS#12 file, verifying its MAC with `passphrase`.
pub fn decode(data: &[u8], passphrase: &str) -> StoreResult<Vec<P12Entry>> {
    let store = KeyStore::from_pkcs12(data, passphrase).map_err(|e| StoreError::Pkcs12(e.to_string()))?;

    Ok(store
        .entries()
        .map(|(alias, entry)| {
            let body = match entry {
                KeyStoreEntry::Certificate(cert) => P12Body::TrustedCert(cert.as_der().to_vec()),
                KeyStoreEntry::PrivateKeyChain(key) => P12Body::Opaque {
                    chain: key.chain().iter().map(|c| c.as_der().to_vec()).collect(),
                    entry: entry.clone(),
                },
                #[allow(unreachable_patterns)]
                _ => P12Body::Opaque {
                    chain: Vec::new(),
                    entry: entry.clone(),
                },
            };
            P12Entry {
                alias: alias.clone(),
                body,
            }
        })
        .collect())
}

/// Encode entries as a PKCS#12 file sealed with `passphrase`.
pub fn encode(entries: &[P12Entry], passphrase: &str) -> StoreResult<Vec<u8>> {
    let mut store = KeyStore::new();
    for e in entries {
        let entry = match &e.body {
            P12Body::TrustedCert(der) => KeyStoreEntry::Certificate(
                P12Certificate::from_der(der).map_err(|err| StoreError::BadCertificate {
                    alias: e.alias.clone(),
                    reason: err.to_string(),
                })?,
            ),
            P12Body::Opaque { entry, .. } => entry.clone(),
        };
        store.add_entry(&e.alias, entry);
    }
    store
        .writer(passphrase)
        .write()
        .map_err(|e| StoreError::Pkcs12(e.to_string()))
}
