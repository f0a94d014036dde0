//! Certificate and chain types.

mod cert;
mod chain;

pub use cert::{Certificate, Validity};
pub use chain::CertificateChain;
