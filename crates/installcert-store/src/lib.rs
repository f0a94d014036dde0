//! # installcert-store
//!
//! Passphrase-protected trust store in the Java KeyStore (JKS) or PKCS#12
//! format, so the file can be a JDK's own `cacerts` / `jssecacerts`. The
//! format is detected on open and kept on save.
//!
//! ```rust,ignore
//! use installcert_store::TrustStore;
//!
//! let mut store = TrustStore::open(path, "changeit")?;
//! store.accept("example.com-0", cert);
//! installcert_store::backup(path)?;
//! store.persist(path, "changeit")?;
//! ```

mod error;
mod jks;
mod pkcs12;
mod store;

pub mod backup;
pub mod locate;

pub use backup::backup;
pub use error::{StoreError, StoreResult};
pub use store::{normalize_alias, Entry, PrivateKeyEntry, StoreFormat, TrustStore, TrustedCertEntry};
