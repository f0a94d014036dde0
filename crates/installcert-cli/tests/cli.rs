//! End-to-end runs of the `installcert` binary.

use std::net::TcpListener;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use assert_cmd::Command;
use installcert_store::TrustStore;
use predicates::prelude::*;
use rustls::pki_types::{CertificateDer, PrivateKeyDer, PrivatePkcs8KeyDer};
use rustls::{ServerConfig, ServerConnection};
use tempfile::TempDir;

const PASS: &str = "changeit";

/// Isolated command: no user config, no inherited JVM or passphrase.
fn installcert(dir: &Path) -> Command {
    let config = dir.join("config.toml");
    std::fs::write(&config, "").unwrap();
    let mut cmd = Command::cargo_bin("installcert").unwrap();
    cmd.env_remove("JAVA_HOME")
        .env_remove("INSTALLCERT_PASSPHRASE")
        .env_remove("RUST_LOG")
        .arg("--no-color")
        .arg("-c")
        .arg(config);
    cmd
}

fn empty_store(dir: &Path) -> PathBuf {
    let path = dir.join("cacerts");
    TrustStore::new().persist(&path, PASS).unwrap();
    path
}

/// Blocking TLS server on its own thread, one connection at a time.
fn spawn_tls_server() -> (u16, Vec<u8>) {
    let params = rcgen::CertificateParams::new(vec!["127.0.0.1".to_string()]).unwrap();
    let key = rcgen::KeyPair::generate().unwrap();
    let der = params.self_signed(&key).unwrap().der().to_vec();

    let config = Arc::new(
        ServerConfig::builder_with_provider(Arc::new(rustls::crypto::ring::default_provider()))
            .with_safe_default_protocol_versions()
            .unwrap()
            .with_no_client_auth()
            .with_single_cert(
                vec![CertificateDer::from(der.clone())],
                PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(key.serialize_der())),
            )
            .unwrap(),
    );

    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    std::thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(mut tcp) = stream else { break };
            let Ok(mut conn) = ServerConnection::new(config.clone()) else { break };
            while conn.is_handshaking() {
                if conn.complete_io(&mut tcp).is_err() {
                    break;
                }
            }
        }
    });
    (port, der)
}

#[test]
fn test_help_exits_zero() {
    let dir = TempDir::new().unwrap();
    installcert(dir.path())
        .arg("-H")
        .assert()
        .success()
        .stdout(predicate::str::contains("--host"))
        .stdout(predicate::str::contains("--noprompt"));
}

#[test]
fn test_version_exits_zero() {
    let dir = TempDir::new().unwrap();
    installcert(dir.path())
        .arg("-V")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_missing_host_exits_one() {
    let dir = TempDir::new().unwrap();
    installcert(dir.path()).assert().code(1);
}

#[test]
fn test_non_numeric_port_exits_one() {
    let dir = TempDir::new().unwrap();
    installcert(dir.path())
        .args(["-h", "example.com", "-p", "https"])
        .assert()
        .code(1);
}

#[test]
fn test_no_store_and_no_java_home_exits_one() {
    let dir = TempDir::new().unwrap();
    installcert(dir.path())
        .args(["-h", "example.com"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("error:"));
}

#[test]
fn test_missing_store_exits_one() {
    let dir = TempDir::new().unwrap();
    let absent = dir.path().join("absent");
    installcert(dir.path())
        .args(["-h", "example.com", "-k"])
        .arg(&absent)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("cannot open"));
}

#[test]
fn test_wrong_passphrase_exits_one() {
    let dir = TempDir::new().unwrap();
    let store = empty_store(dir.path());
    installcert(dir.path())
        .args(["-h", "example.com", "-s", "wrong", "-k"])
        .arg(&store)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("unable to open key store"));
}

#[test]
fn test_closed_port_exits_two() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let dir = TempDir::new().unwrap();
    let store = empty_store(dir.path());
    installcert(dir.path())
        .args(["-h", "127.0.0.1", "-n", "-p", &port.to_string(), "-k"])
        .arg(&store)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("error connecting to 127.0.0.1"));
}

#[test]
fn test_noprompt_installs_chain() {
    let (port, der) = spawn_tls_server();
    let dir = TempDir::new().unwrap();
    let store = empty_store(dir.path());

    installcert(dir.path())
        .args(["-h", "127.0.0.1", "-n", "-t", "5", "-p", &port.to_string(), "-k"])
        .arg(&store)
        .assert()
        .success()
        .stdout(predicate::str::contains("sent 1 certificate"))
        .stdout(predicate::str::contains("Added certificate as '127.0.0.1-0'"))
        .stdout(predicate::str::contains("Saved 1 certificate"));

    let saved = TrustStore::open(&store, PASS).unwrap();
    assert_eq!(saved.certificate("127.0.0.1-0").unwrap().der(), der.as_slice());
}

#[test]
fn test_declining_save_keeps_store() {
    let (port, _) = spawn_tls_server();
    let dir = TempDir::new().unwrap();
    let store = empty_store(dir.path());
    let before = std::fs::read(&store).unwrap();

    installcert(dir.path())
        .args(["-h", "127.0.0.1", "-t", "5", "-p", &port.to_string(), "-k"])
        .arg(&store)
        .write_stdin("y\nn\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Add certificate to key store (Y/n) [Y]"))
        .stdout(predicate::str::contains("Not saving key store"));

    assert_eq!(std::fs::read(&store).unwrap(), before);
}
