//! Command-line argument definitions using clap.

use clap::{ArgAction, Parser};
use std::path::PathBuf;

/// Capture a TLS server's certificate chain and add it to a Java trust store.
///
/// The handshake accepts whatever chain the server sends so it can be
/// inspected; compare the SHA-256 fingerprints against a trusted source
/// before accepting.
#[derive(Parser, Debug)]
#[command(name = "installcert")]
#[command(author, version, about, long_about = None)]
#[command(disable_help_flag = true)]
pub struct Cli {
    /// Host to connect to
    #[arg(short = 'h', long)]
    pub host: String,

    /// Port to connect to (default 443)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Passphrase for the key store (default changeit)
    #[arg(short = 's', long, env = "INSTALLCERT_PASSPHRASE", hide_env_values = true)]
    pub passphrase: Option<String>,

    /// Key store to add to (default is the JVM's jssecacerts or cacerts)
    #[arg(short = 'k', long)]
    pub keystore: Option<PathBuf>,

    /// Java installation whose trust store is used when --keystore is absent
    #[arg(long, env = "JAVA_HOME")]
    pub java_home: Option<PathBuf>,

    /// Do not prompt: add every certificate and save
    #[arg(short = 'n', long)]
    pub noprompt: bool,

    /// Back up the key store before saving
    #[arg(short = 'b', long)]
    pub backup: bool,

    /// Connect and handshake timeout in seconds (default 10)
    #[arg(short = 't', long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: Option<u64>,

    /// Configuration file
    #[arg(short = 'c', long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Debug logging on stderr
    #[arg(short, long)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Print this menu
    #[arg(short = 'H', long, action = ArgAction::Help)]
    pub help: Option<bool>,
}
