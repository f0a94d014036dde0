//! Argument parsing, option resolution and the exit-code dispatcher.

pub mod args;

use std::io::{self, Write};
use std::process::ExitCode;
use std::time::Duration;

use args::Cli;
use clap::Parser;
use colored::Colorize;
use installcert_core::{InstallCertError, DEFAULT_PASSPHRASE, DEFAULT_PORT, DEFAULT_TIMEOUT_SECS};
use installcert_store::locate;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::console::Console;
use crate::session::{self, SessionOptions};

/// Run the CLI application.
///
/// Every failure funnels back here and becomes an exit status:
/// 0 on success, help or version; 1 for usage and local key store
/// problems; 2 when talking to the host failed.
pub async fn run() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() { ExitCode::from(1) } else { ExitCode::SUCCESS };
        }
    };

    init_logging(cli.verbose);
    if cli.no_color {
        colored::control::set_override(false);
    }

    let result = match resolve(&cli) {
        Ok(opts) => {
            let stdin = io::stdin();
            let mut console = Console::new(stdin.lock(), io::stdout());
            let result = session::run(&opts, &mut console).await;
            let _ = console.out().flush();
            result
        }
        Err(e) => Err(e),
    };

    match result {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {e}", "error:".red().bold());
            ExitCode::from(e.exit_code())
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false).with_writer(io::stderr))
        .try_init();
}

/// Merge flags, the config file and defaults into session options.
pub fn resolve(cli: &Cli) -> Result<SessionOptions, InstallCertError> {
    let config = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
    .map_err(|e| InstallCertError::Usage(format!("{e:#}")))?;

    merge(cli, config)
}

fn merge(cli: &Cli, config: Config) -> Result<SessionOptions, InstallCertError> {
    if cli.host.trim().is_empty() {
        return Err(InstallCertError::Usage("host must not be empty".to_string()));
    }

    let explicit = cli.keystore.as_deref().or(config.keystore.as_deref());
    let store_path = locate::resolve_store_path(explicit, cli.java_home.as_deref())?;

    Ok(SessionOptions {
        host: cli.host.trim().to_string(),
        port: cli.port.or(config.port).unwrap_or(DEFAULT_PORT),
        passphrase: cli
            .passphrase
            .clone()
            .or(config.passphrase)
            .unwrap_or_else(|| DEFAULT_PASSPHRASE.to_string()),
        store_path,
        noprompt: cli.noprompt,
        backup: cli.backup || config.backup,
        timeout: Duration::from_secs(cli.timeout.or(config.timeout_secs).unwrap_or(DEFAULT_TIMEOUT_SECS)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn cli(args: &[&str]) -> Cli {
        let mut argv = vec!["installcert"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_defaults() {
        let opts = merge(&cli(&["-h", "example.com", "-k", "/tmp/ks"]), Config::default()).unwrap();
        assert_eq!(opts.port, 443);
        assert_eq!(opts.timeout, Duration::from_secs(10));
        assert!(!opts.backup);
        assert!(!opts.noprompt);
        assert_eq!(opts.store_path, PathBuf::from("/tmp/ks"));
    }

    #[test]
    fn test_config_fills_gaps() {
        let config = Config {
            port: Some(8443),
            passphrase: Some("fromfile".into()),
            keystore: Some(PathBuf::from("/etc/ks")),
            timeout_secs: Some(3),
            backup: true,
        };
        let opts = merge(&cli(&["-h", "example.com"]), config).unwrap();
        assert_eq!(opts.port, 8443);
        assert_eq!(opts.passphrase, "fromfile");
        assert_eq!(opts.store_path, PathBuf::from("/etc/ks"));
        assert_eq!(opts.timeout, Duration::from_secs(3));
        assert!(opts.backup);
    }

    #[test]
    fn test_flags_beat_config() {
        let config = Config {
            port: Some(8443),
            passphrase: Some("fromfile".into()),
            keystore: Some(PathBuf::from("/etc/ks")),
            timeout_secs: Some(3),
            backup: false,
        };
        let opts = merge(
            &cli(&["-h", "example.com", "-p", "9443", "-s", "flag", "-k", "/tmp/ks", "-t", "20"]),
            config,
        )
        .unwrap();
        assert_eq!(opts.port, 9443);
        assert_eq!(opts.passphrase, "flag");
        assert_eq!(opts.store_path, PathBuf::from("/tmp/ks"));
        assert_eq!(opts.timeout, Duration::from_secs(20));
    }

    #[test]
    fn test_blank_host_is_usage_error() {
        let err = merge(&cli(&["-h", " ", "-k", "/tmp/ks"]), Config::default()).unwrap_err();
        assert_eq!(err.exit_code(), 1);
    }
}
