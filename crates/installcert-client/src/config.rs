//! Capture settings.

use std::time::Duration;

use installcert_core::DEFAULT_TIMEOUT_SECS;

/// Settings for one handshake capture.
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// Bound on the TCP connect and, separately, on the TLS handshake.
    pub timeout: Duration,
    /// How long to wait for our `close_notify` to go out after success.
    pub close_grace: Duration,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            close_grace: Duration::from_millis(500),
        }
    }
}

impl CaptureConfig {
    /// Use `timeout` for connect and handshake.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}
