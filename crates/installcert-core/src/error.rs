use thiserror::Error;

/// Result type alias for installcert operations
pub type Result<T> = std::result::Result<T, InstallCertError>;

/// Broad classes of failure, used to pick the process exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad arguments or configuration
    Usage,
    /// Trust store could not be opened, read or decoded
    StoreAccess,
    /// DNS resolution or TCP connect failed
    Network,
    /// TLS negotiation failed or timed out
    Handshake,
    /// Handshake completed but no chain was recorded
    ChainAbsent,
    /// Trust store could not be written
    Persist,
    /// Backup copy could not be made (never terminal)
    Backup,
    /// Terminal output could not be written
    Console,
}

/// Errors that can occur while capturing and installing certificates
#[derive(Error, Debug)]
pub enum InstallCertError {
    /// Invalid command-line arguments or configuration
    #[error("{0}")]
    Usage(String),

    /// Trust store file missing, unreadable or not writable
    #[error("cannot {action} {path}: {reason}")]
    StoreRead {
        /// What was attempted ("open", "read", "write to")
        action: &'static str,
        /// Store path
        path: String,
        /// Underlying cause
        reason: String,
    },

    /// Trust store could not be decoded (bad passphrase or corrupt file)
    #[error("unable to open key store {path}: {reason}")]
    StoreCorrupt {
        /// Store path
        path: String,
        /// Decoder diagnosis
        reason: String,
    },

    /// DNS lookup or TCP connect failed
    #[error("error connecting to {addr}: {reason}")]
    Network {
        /// `host:port` being dialled
        addr: String,
        /// Underlying cause
        reason: String,
    },

    /// TLS handshake failed
    #[error("error communicating with host {addr}: {reason}")]
    Handshake {
        /// `host:port` of the peer
        addr: String,
        /// Underlying cause
        reason: String,
    },

    /// TLS handshake did not finish within the configured bound
    #[error("TLS handshake with {addr} timed out after {secs} seconds")]
    HandshakeTimeout {
        /// `host:port` of the peer
        addr: String,
        /// Configured bound in seconds
        secs: u64,
    },

    /// Handshake succeeded but the verifier never saw a chain
    #[error("failed to obtain certificate chain from {addr}")]
    ChainAbsent {
        /// `host:port` of the peer
        addr: String,
    },

    /// Peer presented bytes that are not an X.509 certificate
    #[error("invalid certificate: {0}")]
    InvalidCertificate(String),

    /// Serializing or writing the store failed
    #[error("error saving keystore {path}: {reason}")]
    Persist {
        /// Store path
        path: String,
        /// Underlying cause
        reason: String,
    },

    /// Backup copy failed
    #[error("error saving backup file {path}: {reason}")]
    Backup {
        /// Intended backup path
        path: String,
        /// Underlying cause
        reason: String,
    },

    /// Writing to the terminal failed
    #[error("console error: {0}")]
    Console(String),
}

impl InstallCertError {
    /// Create a store access error from an I/O failure.
    pub fn store_io(action: &'static str, path: impl Into<String>, err: &std::io::Error) -> Self {
        Self::StoreRead {
            action,
            path: path.into(),
            reason: err.to_string(),
        }
    }

    /// Create a console error from a failed terminal read or write.
    #[allow(clippy::needless_pass_by_value)]
    pub fn console(err: std::io::Error) -> Self {
        Self::Console(err.to_string())
    }

    /// Create a persist error from any displayable cause.
    pub fn persist(path: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::Persist {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Returns the failure class of this error
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Usage(_) => ErrorKind::Usage,
            Self::StoreRead { .. } | Self::StoreCorrupt { .. } => ErrorKind::StoreAccess,
            Self::Network { .. } => ErrorKind::Network,
            Self::Handshake { .. } | Self::HandshakeTimeout { .. } | Self::InvalidCertificate(_) => {
                ErrorKind::Handshake
            }
            Self::ChainAbsent { .. } => ErrorKind::ChainAbsent,
            Self::Persist { .. } => ErrorKind::Persist,
            Self::Backup { .. } => ErrorKind::Backup,
            Self::Console(_) => ErrorKind::Console,
        }
    }

    /// Returns true if the operation can continue after reporting this error
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Backup { .. })
    }

    /// Process exit status for this error.
    ///
    /// 1 for usage and local store problems, 2 for anything that went wrong
    /// talking to the remote host.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self.kind() {
            ErrorKind::Network | ErrorKind::Handshake | ErrorKind::ChainAbsent => 2,
            ErrorKind::Usage
            | ErrorKind::StoreAccess
            | ErrorKind::Persist
            | ErrorKind::Backup
            | ErrorKind::Console => 1,
        }
    }
}
