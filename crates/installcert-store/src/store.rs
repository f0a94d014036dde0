//! In-memory trust store backed by a JKS or PKCS#12 file.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

use chrono::{DateTime, TimeZone, Utc};
use installcert_core::{Certificate, InstallCertError, Result};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::error::{StoreError, StoreResult};
use crate::jks::{self, RawBody, RawEntry};
use crate::locate::real_path;
use crate::pkcs12::{self, P12Body, P12Entry};

/// On-disk container format. A store is written back in the format it was read in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StoreFormat {
    /// Java KeyStore (`0xFEEDFEED`)
    #[default]
    Jks,
    /// PKCS#12 / PFX
    Pkcs12,
}

impl StoreFormat {
    /// Guess the format from the first bytes of a file.
    #[must_use]
    pub fn detect(data: &[u8]) -> Self {
        if pkcs12::sniff(data) {
            Self::Pkcs12
        } else {
            Self::Jks
        }
    }
}

/// A trusted certificate entry.
#[derive(Debug, Clone)]
pub struct TrustedCertEntry {
    /// When the entry was added
    pub created: DateTime<Utc>,
    /// The trusted certificate
    pub certificate: Certificate,
}

/// A private key (or other non-certificate) entry. Never created here,
/// only carried through a rewrite.
#[derive(Debug, Clone)]
pub struct PrivateKeyEntry {
    /// When the entry was added
    pub created: DateTime<Utc>,
    material: KeyMaterial,
    /// Certificate chain for the key, leaf first
    pub chain: Vec<Certificate>,
}

/// Key bytes exactly as the container held them.
#[derive(Clone)]
enum KeyMaterial {
    Jks(Vec<u8>),
    Pkcs12(p12_keystore::KeyStoreEntry),
}

impl std::fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Jks(_) => f.write_str("Jks(..)"),
            Self::Pkcs12(_) => f.write_str("Pkcs12(..)"),
        }
    }
}

/// A store entry.
#[derive(Debug, Clone)]
pub enum Entry {
    /// Trusted certificate (what this tool writes)
    Trusted(TrustedCertEntry),
    /// Private key with its certificate chain
    PrivateKey(PrivateKeyEntry),
}

impl Entry {
    /// When the entry was added.
    #[must_use]
    pub const fn created(&self) -> DateTime<Utc> {
        match self {
            Self::Trusted(e) => e.created,
            Self::PrivateKey(e) => e.created,
        }
    }
}

/// JKS aliases are case-insensitive; they are kept lower case.
#[must_use]
pub fn normalize_alias(alias: &str) -> String {
    alias.to_lowercase()
}

/// Alias-keyed collection of trusted certificates.
#[derive(Debug, Clone, Default)]
pub struct TrustStore {
    format: StoreFormat,
    entries: BTreeMap<String, Entry>,
}

impl TrustStore {
    /// Create an empty JKS store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `format` for the next write.
    #[must_use]
    pub fn with_format(mut self, format: StoreFormat) -> Self {
        self.format = format;
        self
    }

    /// Format the store was read in, and will be written in.
    #[must_use]
    pub const fn format(&self) -> StoreFormat {
        self.format
    }

    /// Read and decode the store at `path`.
    ///
    /// # Errors
    ///
    /// `StoreRead` if the file cannot be read, `StoreCorrupt` if it cannot
    /// be decoded with `passphrase`.
    pub fn open(path: &Path, passphrase: &str) -> Result<Self> {
        let path_str = path.display().to_string();
        let data = std::fs::read(path).map_err(|e| InstallCertError::store_io("read", &path_str, &e))?;

        let store = Self::from_bytes(&data, passphrase).map_err(|e| InstallCertError::StoreCorrupt {
            path: path_str.clone(),
            reason: e.to_string(),
        })?;

        info!(path = %path_str, format = ?store.format, entries = store.len(), "opened key store");
        Ok(store)
    }

    /// Decode a store, detecting JKS or PKCS#12 from the leading bytes.
    pub fn from_bytes(data: &[u8], passphrase: &str) -> StoreResult<Self> {
        match StoreFormat::detect(data) {
            StoreFormat::Jks => Self::from_jks(data, passphrase),
            StoreFormat::Pkcs12 => Self::from_pkcs12(data, passphrase),
        }
    }

    fn from_jks(data: &[u8], passphrase: &str) -> StoreResult<Self> {
        let mut entries = BTreeMap::new();
        for raw in jks::decode(data, passphrase)? {
            let created = millis_to_utc(raw.created_ms);
            let entry = match raw.body {
                RawBody::TrustedCert(der) => Entry::Trusted(TrustedCertEntry {
                    created,
                    certificate: parse_entry_cert(&raw.alias, der)?,
                }),
                RawBody::PrivateKey {
                    protected_key,
                    chain,
                } => Entry::PrivateKey(PrivateKeyEntry {
                    created,
                    material: KeyMaterial::Jks(protected_key),
                    chain: chain
                        .into_iter()
                        .map(|der| parse_entry_cert(&raw.alias, der))
                        .collect::<StoreResult<_>>()?,
                }),
            };
            entries.insert(normalize_alias(&raw.alias), entry);
        }
        Ok(Self {
            format: StoreFormat::Jks,
            entries,
        })
    }

    fn from_pkcs12(data: &[u8], passphrase: &str) -> StoreResult<Self> {
        // PKCS#12 has no creation dates; entries read back are stamped with the open time.
        let created = Utc::now();
        let mut entries = BTreeMap::new();
        for p12 in pkcs12::decode(data, passphrase)? {
            let entry = match p12.body {
                P12Body::TrustedCert(der) => Entry::Trusted(TrustedCertEntry {
                    created,
                    certificate: parse_entry_cert(&p12.alias, der)?,
                }),
                P12Body::Opaque { chain, entry } => Entry::PrivateKey(PrivateKeyEntry {
                    created,
                    material: KeyMaterial::Pkcs12(entry),
                    chain: chain
                        .into_iter()
                        .map(|der| parse_entry_cert(&p12.alias, der))
                        .collect::<StoreResult<_>>()?,
                }),
            };
            entries.insert(normalize_alias(&p12.alias), entry);
        }
        Ok(Self {
            format: StoreFormat::Pkcs12,
            entries,
        })
    }

    /// Encode the store in its format, sealed with `passphrase`.
    pub fn to_bytes(&self, passphrase: &str) -> StoreResult<Vec<u8>> {
        match self.format {
            StoreFormat::Jks => self.to_jks(passphrase),
            StoreFormat::Pkcs12 => self.to_pkcs12(passphrase),
        }
    }

    fn to_jks(&self, passphrase: &str) -> StoreResult<Vec<u8>> {
        let raw = self
            .entries
            .iter()
            .map(|(alias, entry)| {
                let body = match entry {
                    Entry::Trusted(e) => RawBody::TrustedCert(e.certificate.der().to_vec()),
                    Entry::PrivateKey(e) => match &e.material {
                        KeyMaterial::Jks(protected_key) => RawBody::PrivateKey {
                            protected_key: protected_key.clone(),
                            chain: e.chain.iter().map(|c| c.der().to_vec()).collect(),
                        },
                        KeyMaterial::Pkcs12(_) => return Err(StoreError::Unconvertible(alias.clone())),
                    },
                };
                Ok(RawEntry {
                    alias: alias.clone(),
                    created_ms: entry.created().timestamp_millis(),
                    body,
                })
            })
            .collect::<StoreResult<Vec<_>>>()?;
        jks::encode(&raw, passphrase)
    }

    fn to_pkcs12(&self, passphrase: &str) -> StoreResult<Vec<u8>> {
        let entries = self
            .entries
            .iter()
            .map(|(alias, entry)| {
                let body = match entry {
                    Entry::Trusted(e) => P12Body::TrustedCert(e.certificate.der().to_vec()),
                    Entry::PrivateKey(e) => match &e.material {
                        KeyMaterial::Pkcs12(entry) => P12Body::Opaque {
                            chain: Vec::new(),
                            entry: entry.clone(),
                        },
                        KeyMaterial::Jks(_) => return Err(StoreError::Unconvertible(alias.clone())),
                    },
                };
                Ok(P12Entry {
                    alias: alias.clone(),
                    body,
                })
            })
            .collect::<StoreResult<Vec<_>>>()?;
        pkcs12::encode(&entries, passphrase)
    }

    /// Add `cert` as a trusted entry under `alias`.
    ///
    /// An existing entry with the same alias is replaced and returned.
    pub fn accept(&mut self, alias: &str, cert: Certificate) -> Option<Entry> {
        let alias = normalize_alias(alias);
        let entry = Entry::Trusted(TrustedCertEntry {
            created: Utc::now(),
            certificate: cert,
        });
        let replaced = self.entries.insert(alias.clone(), entry);
        if replaced.is_some() {
            debug!(alias = %alias, "replaced existing key store entry");
        } else {
            debug!(alias = %alias, "added key store entry");
        }
        replaced
    }

    /// Look up an entry.
    #[must_use]
    pub fn get(&self, alias: &str) -> Option<&Entry> {
        self.entries.get(&normalize_alias(alias))
    }

    /// Trusted certificate stored under `alias`, if any.
    #[must_use]
    pub fn certificate(&self, alias: &str) -> Option<&Certificate> {
        match self.get(alias)? {
            Entry::Trusted(e) => Some(&e.certificate),
            Entry::PrivateKey(_) => None,
        }
    }

    /// All aliases, sorted.
    pub fn aliases(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Certificates from trusted entries; these seed TLS trust decisions.
    pub fn trust_anchors(&self) -> impl Iterator<Item = &Certificate> {
        self.entries.values().filter_map(|entry| match entry {
            Entry::Trusted(e) => Some(&e.certificate),
            Entry::PrivateKey(_) => None,
        })
    }

    /// Alias of a trusted entry holding exactly `cert`, if present.
    #[must_use]
    pub fn find(&self, cert: &Certificate) -> Option<&str> {
        self.entries.iter().find_map(|(alias, entry)| match entry {
            Entry::Trusted(e) if e.certificate.der() == cert.der() => Some(alias.as_str()),
            _ => None,
        })
    }

    /// Write the store to `path`.
    ///
    /// The bytes go to a temporary file in the same directory which then
    /// replaces `path`, so a failed write leaves the previous file intact.
    /// The previous file's permissions are carried over. If `path` is a
    /// symlink (as `cacerts` often is on Linux), the file it points to is
    /// replaced and the link is left alone.
    ///
    /// # Errors
    ///
    /// `Persist` if encoding or any filesystem step fails.
    pub fn persist(&self, path: &Path, passphrase: &str) -> Result<()> {
        let path_str = path.display().to_string();
        let bytes = self
            .to_bytes(passphrase)
            .map_err(|e| InstallCertError::persist(&path_str, e))?;

        let target = real_path(path);
        if path.is_symlink() {
            debug!(link = %path_str, target = %target.display(), "writing through symlink");
        }
        let path = target.as_path();

        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(dir).map_err(|e| InstallCertError::persist(&path_str, e))?;
        tmp.write_all(&bytes)
            .and_then(|()| tmp.as_file().sync_all())
            .map_err(|e| InstallCertError::persist(&path_str, e))?;

        if let Ok(meta) = std::fs::metadata(path) {
            std::fs::set_permissions(tmp.path(), meta.permissions())
                .map_err(|e| InstallCertError::persist(&path_str, e))?;
        }

        tmp.persist(path)
            .map_err(|e| InstallCertError::persist(&path_str, e.error))?;

        info!(path = %path_str, entries = self.len(), "key store written");
        Ok(())
    }
}

fn parse_entry_cert(alias: &str, der: Vec<u8>) -> StoreResult<Certificate> {
    Certificate::from_der(der).map_err(|e| StoreError::BadCertificate {
        alias: alias.to_string(),
        reason: e.to_string(),
    })
}

fn millis_to_utc(ms: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(ms)
        .single()
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}
