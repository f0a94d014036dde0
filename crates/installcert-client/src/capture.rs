//! Connect, handshake, and hand back what the server presented.

use std::sync::Arc;

use installcert_core::{Certificate, CertificateChain, InstallCertError, Result};
use rustls::crypto::CryptoProvider;
use rustls::pki_types::ServerName;
use rustls::ClientConfig;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_rustls::TlsConnector;
use tracing::{debug, info};

use crate::config::CaptureConfig;
use crate::verifier::{CapturingVerifier, Recorded, TrustVerdict};

/// Result of a successful capture.
#[derive(Debug, Clone)]
pub struct Capture {
    /// Chain as presented, leaf first
    pub chain: CertificateChain,
    /// Whether the store already trusts this chain
    pub verdict: TrustVerdict,
    /// Negotiated protocol version (e.g. `TLSv1_3`)
    pub protocol: Option<String>,
    /// Negotiated cipher suite
    pub cipher_suite: Option<String>,
}

/// Performs permissive TLS handshakes.
#[derive(Debug, Clone)]
pub struct Capturer {
    config: CaptureConfig,
    provider: Arc<CryptoProvider>,
}

impl Default for Capturer {
    fn default() -> Self {
        Self::new(CaptureConfig::default())
    }
}

impl Capturer {
    /// Create a capturer using the ring crypto provider.
    #[must_use]
    pub fn new(config: CaptureConfig) -> Self {
        Self {
            config,
            provider: Arc::new(rustls::crypto::ring::default_provider()),
        }
    }

    /// Connect to `host:port` and record the certificate chain it presents.
    ///
    /// `anchors` seed the wrapped evaluator, which only decides
    /// [`Capture::verdict`]; the handshake proceeds whatever it says.
    ///
    /// # Errors
    ///
    /// - `Usage` if `host` is not a valid DNS name or IP address
    /// - `Network` on resolution/connect failure or connect timeout
    /// - `Handshake` / `HandshakeTimeout` if TLS negotiation fails or stalls
    /// - `ChainAbsent` if the handshake finished without a chain being recorded
    pub async fn capture<'a>(
        &self,
        host: &str,
        port: u16,
        anchors: impl IntoIterator<Item = &'a Certificate>,
    ) -> Result<Capture> {
        let addr = format!("{host}:{port}");
        let server_name = ServerName::try_from(host.to_string())
            .map_err(|e| InstallCertError::Usage(format!("invalid host {host}: {e}")))?;

        let verifier = Arc::new(CapturingVerifier::new(anchors, &self.provider));
        let tls_config = ClientConfig::builder_with_provider(self.provider.clone())
            .with_safe_default_protocol_versions()
            .map_err(|e| InstallCertError::Handshake {
                addr: addr.clone(),
                reason: e.to_string(),
            })?
            .dangerous()
            .with_custom_certificate_verifier(verifier.clone())
            .with_no_client_auth();
        let connector = TlsConnector::from(Arc::new(tls_config));

        let secs = self.config.timeout.as_secs();
        info!(host, port, "opening connection");
        let tcp = timeout(self.config.timeout, TcpStream::connect((host, port)))
            .await
            .map_err(|_| InstallCertError::Network {
                addr: addr.clone(),
                reason: format!("connect timed out after {secs} seconds"),
            })?
            .map_err(|e| InstallCertError::Network {
                addr: addr.clone(),
                reason: e.to_string(),
            })?;

        debug!(host, port, "starting TLS handshake");
        let mut tls = timeout(self.config.timeout, connector.connect(server_name, tcp))
            .await
            .map_err(|_| InstallCertError::HandshakeTimeout {
                addr: addr.clone(),
                secs,
            })?
            .map_err(|e| InstallCertError::Handshake {
                addr: addr.clone(),
                reason: e.to_string(),
            })?;

        let (_, session) = tls.get_ref();
        let protocol = session.protocol_version().map(|v| format!("{v:?}"));
        let cipher_suite = session
            .negotiated_cipher_suite()
            .map(|s| format!("{:?}", s.suite()));

        // The chain is already in hand; a peer that ignores close_notify must not hold us up.
        if timeout(self.config.close_grace, tls.shutdown()).await.is_err() {
            debug!(host, port, "peer did not acknowledge close");
        }
        drop(tls);

        let capture = assemble(&addr, verifier.take(), protocol, cipher_suite)?;
        info!(host, port, certs = capture.chain.len(), "obtained certificate chain");
        Ok(capture)
    }
}

/// Turn what the verifier recorded into a [`Capture`].
fn assemble(
    addr: &str,
    recorded: Option<Recorded>,
    protocol: Option<String>,
    cipher_suite: Option<String>,
) -> Result<Capture> {
    let absent = || InstallCertError::ChainAbsent { addr: addr.to_string() };
    let recorded = recorded.ok_or_else(absent)?;

    let certs = recorded
        .chain
        .iter()
        .map(|der| Certificate::from_der(der.as_ref()))
        .collect::<Result<Vec<_>>>()?;
    let chain = CertificateChain::new(certs).ok_or_else(absent)?;

    Ok(Capture {
        chain,
        verdict: recorded.verdict,
        protocol,
        cipher_suite,
    })
}
