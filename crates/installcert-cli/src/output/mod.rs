//! Operator-facing report formatting.
//!
//! Everything here writes to a caller-supplied stream so the session can
//! be driven against a buffer in tests.

use std::io::{self, Write};

use colored::Colorize;
use installcert_client::{Capture, TrustVerdict};
use installcert_core::inspect::colon_hex;
use installcert_core::{CertificateSummary, Validity};

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

/// Describe the handshake and what it produced.
pub fn print_capture<W: Write>(w: &mut W, host: &str, port: u16, capture: &Capture) -> io::Result<()> {
    let count = capture.chain.len();
    writeln!(
        w,
        "Server {}:{} sent {} certificate{}",
        host.cyan().bold(),
        port,
        count.to_string().bold(),
        if count == 1 { "" } else { "s" }
    )?;

    if let (Some(protocol), Some(suite)) = (&capture.protocol, &capture.cipher_suite) {
        writeln!(w, "{} {} {}", "Negotiated:".bold(), protocol, suite.dimmed())?;
    }

    match &capture.verdict {
        TrustVerdict::Trusted => {
            writeln!(w, "{}", "The key store already trusts this chain.".green())?;
        }
        TrustVerdict::Untrusted(reason) => {
            writeln!(w, "{} {}", "Not trusted by the key store:".yellow(), reason.dimmed())?;
        }
    }
    writeln!(w)
}

/// Describe one certificate of the chain.
///
/// `existing` names the alias under which the store already holds this
/// exact certificate, if any.
pub fn print_certificate<W: Write>(
    w: &mut W,
    summary: &CertificateSummary,
    existing: Option<&str>,
) -> io::Result<()> {
    writeln!(w, "{}", format!("Certificate {}", summary.index).bold().cyan())?;
    writeln!(w, "  {:<9} {}", "Subject:".bold(), summary.subject)?;
    if summary.self_issued {
        writeln!(w, "  {:<9} {}", "Issuer:".bold(), "(self-signed)".dimmed())?;
    } else {
        writeln!(w, "  {:<9} {}", "Issuer:".bold(), summary.issuer)?;
    }
    writeln!(w, "  {:<9} {}", "Serial:".bold(), summary.serial)?;

    let from = summary.not_before.format(DATE_FORMAT).to_string();
    let until = summary.not_after.format(DATE_FORMAT).to_string();
    let (from, until) = match summary.validity {
        Validity::NotYetValid => (format!("{from} (not yet valid)").red().to_string(), until),
        Validity::Valid => (from, until),
        Validity::Expired => (from, format!("{until} (expired)").red().to_string()),
    };
    writeln!(w, "  {:<9} {} to {}", "Valid:".bold(), from, until)?;

    writeln!(w, "  {:<9} {}", "SHA256:".bold(), colon_hex(summary.fingerprints.primary()))?;
    writeln!(w, "  {:<9} {}", "SHA1:".bold(), colon_hex(&summary.fingerprints.sha1).dimmed())?;
    writeln!(w, "  {:<9} {}", "MD5:".bold(), colon_hex(&summary.fingerprints.md5).dimmed())?;

    if let Some(alias) = existing {
        writeln!(w, "  {}", format!("Already in key store as '{alias}'").green())?;
    }
    writeln!(w)
}

/// Confirm an accepted certificate.
pub fn print_added<W: Write>(w: &mut W, alias: &str, replaced: bool) -> io::Result<()> {
    let verb = if replaced { "Replaced" } else { "Added" };
    writeln!(w, "{} certificate as '{}'", verb.green(), alias.bold())?;
    writeln!(w)
}

/// Note a declined certificate.
pub fn print_skipped<W: Write>(w: &mut W) -> io::Result<()> {
    writeln!(w, "{}", "Certificate not added to key store".dimmed())?;
    writeln!(w)
}

/// Report where the backup went.
pub fn print_backup<W: Write>(w: &mut W, from: &str, to: &str) -> io::Result<()> {
    writeln!(w, "Backed up {from} to {}", to.bold())
}

/// Closing line once the store is on disk.
pub fn print_saved<W: Write>(w: &mut W, added: usize, path: &str) -> io::Result<()> {
    writeln!(
        w,
        "{} {} certificate{} to {}",
        "Saved".green().bold(),
        added,
        if added == 1 { "" } else { "s" },
        path
    )
}

/// Closing line when nothing is written.
pub fn print_not_saved<W: Write>(w: &mut W) -> io::Result<()> {
    writeln!(w, "{}", "Not saving key store, exiting.".yellow())
}
