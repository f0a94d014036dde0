//! # installcert-client
//!
//! Connects to a TLS server with a verifier that accepts any chain and
//! records it, so the operator can inspect certificates the local store does
//! not (yet) trust.
//!
//! ```rust,ignore
//! use installcert_client::{Capturer, CaptureConfig};
//!
//! let capturer = Capturer::new(CaptureConfig::default());
//! let capture = capturer.capture("example.com", 443, store.trust_anchors()).await?;
//! for cert in &capture.chain {
//!     println!("{}", cert.subject());
//! }
//! ```

pub mod algorithms;
mod capture;
mod config;
pub mod verifier;

pub use capture::{Capture, Capturer};
pub use config::CaptureConfig;
pub use verifier::{CapturingVerifier, TrustVerdict};
