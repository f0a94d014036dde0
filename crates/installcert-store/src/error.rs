use thiserror::Error;

/// Result type alias for key store encoding operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Errors from decoding or encoding a key store file
#[derive(Error, Debug)]
pub enum StoreError {
    /// File does not start with the JKS magic number
    #[error("invalid keystore format")]
    BadMagic,

    /// PKCS#12 container could not be decoded or encoded
    #[error("PKCS#12 key store: {0}")]
    Pkcs12(String),

    /// Entry cannot be carried into the other container format
    #[error("entry {0} cannot be converted between JKS and PKCS#12")]
    Unconvertible(String),

    /// File is a JCEKS container
    #[error("JCEKS key stores are not supported")]
    Jceks,

    /// Unknown format version
    #[error("unsupported keystore version {0}")]
    UnsupportedVersion(u32),

    /// Ran out of bytes mid-structure
    #[error("keystore data is truncated")]
    Truncated,

    /// Entry tag is neither a private key nor a trusted certificate
    #[error("unknown keystore entry tag {0}")]
    UnknownTag(u32),

    /// Alias or type string is not valid modified UTF-8
    #[error("invalid string encoding in keystore")]
    BadString,

    /// Certificate type other than X.509
    #[error("unsupported certificate type {0}")]
    UnsupportedCertType(String),

    /// Integrity digest mismatch
    #[error("keystore was tampered with, or password was incorrect")]
    IntegrityCheckFailed,

    /// Bytes left over after the integrity digest
    #[error("unexpected data after keystore digest")]
    TrailingData,

    /// Entry holds bytes that are not an X.509 certificate
    #[error("entry {alias}: {reason}")]
    BadCertificate {
        /// Entry alias
        alias: String,
        /// Parser diagnosis
        reason: String,
    },

    /// A field exceeds what the format can represent
    #[error("{0} is too large to encode")]
    TooLarge(&'static str),
}
