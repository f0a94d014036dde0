//! X.509 certificate as received from a peer or read from a store.

use chrono::{DateTime, TimeZone, Utc};
use x509_parser::objects::{oid2abbrev, oid_registry};
use x509_parser::x509::X509Name;

use crate::error::{InstallCertError, Result};

/// Where a point in time falls relative to a validity period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validity {
    /// Before `notBefore`
    NotYetValid,
    /// Within the period
    Valid,
    /// After `notAfter`
    Expired,
}

/// A parsed X.509 certificate.
///
/// Keeps the exact DER bytes alongside the fields shown to the operator.
/// Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Certificate {
    der: Vec<u8>,
    subject: String,
    issuer: String,
    serial: String,
    not_before: DateTime<Utc>,
    not_after: DateTime<Utc>,
}

impl Certificate {
    /// Parse a DER-encoded certificate.
    ///
    /// # Errors
    ///
    /// Returns `InstallCertError::InvalidCertificate` if the bytes are not a
    /// well-formed X.509 certificate.
    pub fn from_der(der: impl Into<Vec<u8>>) -> Result<Self> {
        let der = der.into();
        let (subject, issuer, serial, not_before, not_after) = {
            let (_, cert) = x509_parser::parse_x509_certificate(&der)
                .map_err(|e| InstallCertError::InvalidCertificate(e.to_string()))?;
            (
                display_name(cert.subject()),
                display_name(cert.issuer()),
                cert.raw_serial_as_string(),
                asn1_to_utc(cert.validity().not_before),
                asn1_to_utc(cert.validity().not_after),
            )
        };

        Ok(Self {
            der,
            subject,
            issuer,
            serial,
            not_before,
            not_after,
        })
    }

    /// Raw DER encoding.
    #[must_use]
    pub fn der(&self) -> &[u8] {
        &self.der
    }

    /// Subject distinguished name (human-readable)
    #[must_use]
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Issuer distinguished name (human-readable)
    #[must_use]
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Serial number (colon-separated hex)
    #[must_use]
    pub fn serial(&self) -> &str {
        &self.serial
    }

    /// Not valid before
    #[must_use]
    pub const fn not_before(&self) -> DateTime<Utc> {
        self.not_before
    }

    /// Not valid after
    #[must_use]
    pub const fn not_after(&self) -> DateTime<Utc> {
        self.not_after
    }

    /// Where `now` falls relative to the validity period.
    #[must_use]
    pub fn validity_at(&self, now: DateTime<Utc>) -> Validity {
        if now < self.not_before {
            Validity::NotYetValid
        } else if now > self.not_after {
            Validity::Expired
        } else {
            Validity::Valid
        }
    }

    /// Whether subject and issuer are the same name.
    #[must_use]
    pub fn is_self_issued(&self) -> bool {
        self.subject == self.issuer
    }
}

/// Render a name most-specific RDN first (`CN=..., O=..., C=..`), the way
/// keytool prints it. DER stores the RDNs in the opposite order.
fn display_name(name: &X509Name<'_>) -> String {
    let rdns: Vec<String> = name
        .iter_rdn()
        .map(|rdn| {
            rdn.iter()
                .map(|attr| {
                    let key = oid2abbrev(attr.attr_type(), oid_registry())
                        .map_or_else(|_| attr.attr_type().to_id_string(), str::to_string);
                    let value = attr.as_str().map_or_else(
                        |_| format!("#{}", hex::encode(attr.as_slice())),
                        str::to_string,
                    );
                    format!("{key}={value}")
                })
                .collect::<Vec<_>>()
                .join(" + ")
        })
        .collect();
    rdns.into_iter().rev().collect::<Vec<_>>().join(", ")
}

/// Convert an ASN.1 `GeneralizedTime` / `UTCTime` to `DateTime<Utc>`.
fn asn1_to_utc(t: x509_parser::time::ASN1Time) -> DateTime<Utc> {
    Utc.timestamp_opt(t.timestamp(), 0)
        .single()
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}
