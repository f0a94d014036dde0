//! # installcert-core
//!
//! Types and pure logic shared by the installcert crates.
//!
//! - [`Certificate`] / [`CertificateChain`]: what a TLS peer presented
//! - [`inspect`]: fingerprints and display summaries
//! - [`alias`]: deterministic store aliases (`{host}-{index}`)
//! - [`prompt`]: the accept/reject rule for operator answers
//! - [`InstallCertError`]: the error taxonomy and exit-code mapping

pub mod alias;
pub mod error;
pub mod inspect;
pub mod prompt;
pub mod types;

pub use error::{ErrorKind, InstallCertError, Result};
pub use inspect::{digest, CertificateSummary, Fingerprints};
pub use prompt::{decide, Decision};
pub use types::{Certificate, CertificateChain, Validity};

/// Default TLS port.
pub const DEFAULT_PORT: u16 = 443;

/// Default store passphrase (the JDK's well-known `cacerts` password).
pub const DEFAULT_PASSPHRASE: &str = "changeit";

/// Default bound on connect and handshake, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
