//! installcert - trust a TLS server's certificate chain
//!
//! Connects to a host, shows the chain it presents, and adds the
//! certificates you accept to a Java trust store.

use std::process::ExitCode;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    installcert_cli::run().await
}
