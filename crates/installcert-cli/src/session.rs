//! One capture-and-install run.

use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::time::Duration;

use colored::Colorize;
use installcert_client::{CaptureConfig, Capturer};
use installcert_core::{CertificateSummary, InstallCertError, Result};
use installcert_store::{backup, locate, TrustStore};
use tracing::warn;

use crate::console::Console;
use crate::output;

/// Fully resolved settings for a run.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub host: String,
    pub port: u16,
    pub passphrase: String,
    pub store_path: PathBuf,
    pub noprompt: bool,
    pub backup: bool,
    pub timeout: Duration,
}

/// What a run did to the store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Outcome {
    /// Aliases written, in chain order
    pub added: Vec<String>,
    /// Whether the store was written back
    pub saved: bool,
    /// Backup file, if one was made
    pub backup: Option<PathBuf>,
}

/// Open the store, capture the chain, let the operator choose, and save.
///
/// Nothing is written unless the save is confirmed (or `noprompt`).
///
/// # Errors
///
/// Any non-recoverable [`installcert_core::InstallCertError`]; a failed
/// backup is reported on stderr and the save continues.
pub async fn run<R: BufRead, W: Write>(opts: &SessionOptions, console: &mut Console<R, W>) -> Result<Outcome> {
    let store_path = opts.store_path.as_path();
    let store_display = store_path.display().to_string();

    locate::check_access(store_path)?;
    let mut store = TrustStore::open(store_path, &opts.passphrase)?;

    let capturer = Capturer::new(CaptureConfig::default().with_timeout(opts.timeout));
    let capture = capturer
        .capture(&opts.host, opts.port, store.trust_anchors())
        .await?;
    output::print_capture(console.out(), &opts.host, opts.port, &capture).map_err(InstallCertError::console)?;

    let mut outcome = Outcome::default();
    for (index, (alias, cert)) in capture.chain.aliased(&opts.host).enumerate() {
        let summary = CertificateSummary::new(index, cert);
        output::print_certificate(console.out(), &summary, store.find(cert)).map_err(InstallCertError::console)?;

        if opts.noprompt || ask(console, "Add certificate to key store")? {
            let replaced = store.accept(&alias, cert.clone()).is_some();
            output::print_added(console.out(), &alias, replaced).map_err(InstallCertError::console)?;
            outcome.added.push(alias);
        } else {
            output::print_skipped(console.out()).map_err(InstallCertError::console)?;
        }
    }

    if !opts.noprompt && !ask(console, "Save modified key store")? {
        output::print_not_saved(console.out()).map_err(InstallCertError::console)?;
        return Ok(outcome);
    }

    if opts.backup {
        match backup(store_path) {
            Ok(target) => {
                output::print_backup(console.out(), &store_display, &target.display().to_string())
                    .map_err(InstallCertError::console)?;
                outcome.backup = Some(target);
            }
            Err(e) if e.is_recoverable() => {
                warn!(path = %store_display, error = %e, "backup failed, saving anyway");
                eprintln!("{} {e}", "warning:".yellow().bold());
            }
            Err(e) => return Err(e),
        }
    }

    store.persist(store_path, &opts.passphrase)?;
    outcome.saved = true;
    output::print_saved(console.out(), outcome.added.len(), &store_display).map_err(InstallCertError::console)?;

    Ok(outcome)
}

fn ask<R: BufRead, W: Write>(console: &mut Console<R, W>, message: &str) -> Result<bool> {
    console
        .confirm(message)
        .map(|d| d.is_accept())
        .map_err(InstallCertError::console)
}
