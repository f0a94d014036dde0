//! # installcert-cli
//!
//! Command-line front end for installcert.
//!
//! ## Flow
//!
//! 1. Resolve and open the trust store (`--keystore`, or `jssecacerts` /
//!    `cacerts` under `JAVA_HOME`)
//! 2. Handshake with `--host`/`--port`, recording the presented chain
//! 3. Show each certificate and ask whether to add it
//! 4. Ask whether to save, optionally back up, then write the store

pub mod cli;
pub mod config;
pub mod console;
pub mod output;
pub mod session;

pub use cli::run;
