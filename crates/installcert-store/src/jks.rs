//! Java KeyStore (JKS) binary codec.
//!
//! ## Layout (big-endian)
//!
//! ```text
//! u32 magic 0xFEEDFEED
//! u32 version (1 or 2)
//! u32 entry count
//! entries:
//!   u32 tag (1 = private key, 2 = trusted certificate)
//!   utf alias
//!   u64 creation time (ms since epoch)
//!   tag 1: u32 len, protected key bytes, u32 chain length, certs...
//!   tag 2: cert
//!   cert = [v2: utf type] u32 len, DER bytes
//! [u8; 20] SHA-1(UTF-16BE(passphrase) || "Mighty Aphrodite" || everything above)
//! ```
//!
//! `utf` is Java's modified UTF-8: u16 byte length, NUL as `C0 80`,
//! supplementary characters as surrogate pairs.

use ring::digest::{Context, SHA1_FOR_LEGACY_USE_ONLY};

use crate::error::{StoreError, StoreResult};

const MAGIC: u32 = 0xFEED_FEED;
const JCEKS_MAGIC: u32 = 0xCECE_CECE;
const VERSION_1: u32 = 1;
const VERSION_2: u32 = 2;
const TAG_PRIVATE_KEY: u32 = 1;
const TAG_TRUSTED_CERT: u32 = 2;
const WHITENER: &[u8] = b"Mighty Aphrodite";
const DIGEST_LEN: usize = 20;

/// Certificate type written for every certificate.
pub const X509: &str = "X.509";

/// One decoded entry, certificates still raw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEntry {
    pub alias: String,
    pub created_ms: i64,
    pub body: RawBody,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawBody {
    TrustedCert(Vec<u8>),
    PrivateKey {
        protected_key: Vec<u8>,
        chain: Vec<Vec<u8>>,
    },
}

/// Decode a JKS file, checking the integrity digest against `passphrase`.
pub fn decode(data: &[u8], passphrase: &str) -> StoreResult<Vec<RawEntry>> {
    if data.len() < DIGEST_LEN {
        return Err(StoreError::Truncated);
    }

    let mut r = Reader::new(data);
    match r.u32()? {
        MAGIC => {}
        JCEKS_MAGIC => return Err(StoreError::Jceks),
        _ => return Err(StoreError::BadMagic),
    }
    let version = r.u32()?;
    if version != VERSION_1 && version != VERSION_2 {
        return Err(StoreError::UnsupportedVersion(version));
    }

    let count = r.u32()?;
    let mut entries = Vec::with_capacity(count.min(1024) as usize);
    for _ in 0..count {
        let tag = r.u32()?;
        let alias = r.utf()?;
        #[allow(clippy::cast_possible_wrap)]
        let created_ms = r.u64()? as i64;
        let body = match tag {
            TAG_PRIVATE_KEY => {
                let key_len = r.u32()? as usize;
                let protected_key = r.bytes(key_len)?.to_vec();
                let chain_len = r.u32()?;
                let mut chain = Vec::with_capacity(chain_len.min(16) as usize);
                for _ in 0..chain_len {
                    chain.push(r.cert(version)?);
                }
                RawBody::PrivateKey {
                    protected_key,
                    chain,
                }
            }
            TAG_TRUSTED_CERT => RawBody::TrustedCert(r.cert(version)?),
            other => return Err(StoreError::UnknownTag(other)),
        };
        entries.push(RawEntry {
            alias,
            created_ms,
            body,
        });
    }

    let body_len = r.pos;
    let stored = r.bytes(DIGEST_LEN)?;
    if !r.is_empty() {
        return Err(StoreError::TrailingData);
    }
    if integrity_digest(passphrase, &data[..body_len]).as_slice() != stored {
        return Err(StoreError::IntegrityCheckFailed);
    }

    Ok(entries)
}

/// Encode entries as a version 2 JKS file sealed with `passphrase`.
pub fn encode(entries: &[RawEntry], passphrase: &str) -> StoreResult<Vec<u8>> {
    let mut w = Vec::new();
    w.extend_from_slice(&MAGIC.to_be_bytes());
    w.extend_from_slice(&VERSION_2.to_be_bytes());
    put_len(&mut w, entries.len(), "entry count")?;

    for entry in entries {
        match &entry.body {
            RawBody::PrivateKey {
                protected_key,
                chain,
            } => {
                w.extend_from_slice(&TAG_PRIVATE_KEY.to_be_bytes());
                put_utf(&mut w, &entry.alias)?;
                #[allow(clippy::cast_sign_loss)]
                w.extend_from_slice(&(entry.created_ms as u64).to_be_bytes());
                put_len(&mut w, protected_key.len(), "protected key")?;
                w.extend_from_slice(protected_key);
                put_len(&mut w, chain.len(), "certificate chain")?;
                for der in chain {
                    put_cert(&mut w, der)?;
                }
            }
            RawBody::TrustedCert(der) => {
                w.extend_from_slice(&TAG_TRUSTED_CERT.to_be_bytes());
                put_utf(&mut w, &entry.alias)?;
                #[allow(clippy::cast_sign_loss)]
                w.extend_from_slice(&(entry.created_ms as u64).to_be_bytes());
                put_cert(&mut w, der)?;
            }
        }
    }

    let digest = integrity_digest(passphrase, &w);
    w.extend_from_slice(&digest);
    Ok(w)
}

/// SHA-1 over the passphrase as UTF-16BE, the whitener, and the store body.
fn integrity_digest(passphrase: &str, body: &[u8]) -> Vec<u8> {
    let mut ctx = Context::new(&SHA1_FOR_LEGACY_USE_ONLY);
    for unit in passphrase.encode_utf16() {
        ctx.update(&unit.to_be_bytes());
    }
    ctx.update(WHITENER);
    ctx.update(body);
    ctx.finish().as_ref().to_vec()
}

fn put_len(w: &mut Vec<u8>, len: usize, what: &'static str) -> StoreResult<()> {
    let len = u32::try_from(len).map_err(|_| StoreError::TooLarge(what))?;
    w.extend_from_slice(&len.to_be_bytes());
    Ok(())
}

fn put_cert(w: &mut Vec<u8>, der: &[u8]) -> StoreResult<()> {
    put_utf(w, X509)?;
    put_len(w, der.len(), "certificate")?;
    w.extend_from_slice(der);
    Ok(())
}

fn put_utf(w: &mut Vec<u8>, s: &str) -> StoreResult<()> {
    let encoded = encode_modified_utf8(s);
    let len = u16::try_from(encoded.len()).map_err(|_| StoreError::TooLarge("alias"))?;
    w.extend_from_slice(&len.to_be_bytes());
    w.extend_from_slice(&encoded);
    Ok(())
}

#[allow(clippy::cast_possible_truncation)]
fn encode_modified_utf8(s: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(s.len());
    for unit in s.encode_utf16() {
        match unit {
            0x0001..=0x007F => out.push(unit as u8),
            0x0000 | 0x0080..=0x07FF => {
                out.push(0xC0 | (unit >> 6) as u8);
                out.push(0x80 | (unit & 0x3F) as u8);
            }
            _ => {
                out.push(0xE0 | (unit >> 12) as u8);
                out.push(0x80 | ((unit >> 6) & 0x3F) as u8);
                out.push(0x80 | (unit & 0x3F) as u8);
            }
        }
    }
    out
}

fn decode_modified_utf8(bytes: &[u8]) -> StoreResult<String> {
    let mut units = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        let (unit, width) = if b & 0x80 == 0 {
            (u16::from(b), 1)
        } else if b & 0xE0 == 0xC0 {
            let b1 = continuation(bytes, i + 1)?;
            ((u16::from(b & 0x1F) << 6) | b1, 2)
        } else if b & 0xF0 == 0xE0 {
            let b1 = continuation(bytes, i + 1)?;
            let b2 = continuation(bytes, i + 2)?;
            ((u16::from(b & 0x0F) << 12) | (b1 << 6) | b2, 3)
        } else {
            return Err(StoreError::BadString);
        };
        units.push(unit);
        i += width;
    }
    String::from_utf16(&units).map_err(|_| StoreError::BadString)
}

fn continuation(bytes: &[u8], at: usize) -> StoreResult<u16> {
    match bytes.get(at) {
        Some(b) if b & 0xC0 == 0x80 => Ok(u16::from(b & 0x3F)),
        _ => Err(StoreError::BadString),
    }
}

struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    const fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    const fn is_empty(&self) -> bool {
        self.pos >= self.buf.len()
    }

    fn bytes(&mut self, n: usize) -> StoreResult<&'a [u8]> {
        let end = self.pos.checked_add(n).ok_or(StoreError::Truncated)?;
        let slice = self.buf.get(self.pos..end).ok_or(StoreError::Truncated)?;
        self.pos = end;
        Ok(slice)
    }

    fn array<const N: usize>(&mut self) -> StoreResult<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.bytes(N)?);
        Ok(out)
    }

    fn u16(&mut self) -> StoreResult<u16> {
        self.array().map(u16::from_be_bytes)
    }

    fn u32(&mut self) -> StoreResult<u32> {
        self.array().map(u32::from_be_bytes)
    }

    fn u64(&mut self) -> StoreResult<u64> {
        self.array().map(u64::from_be_bytes)
    }

    fn utf(&mut self) -> StoreResult<String> {
        let len = self.u16()? as usize;
        decode_modified_utf8(self.bytes(len)?)
    }

    fn cert(&mut self, version: u32) -> StoreResult<Vec<u8>> {
        if version == VERSION_2 {
            let cert_type = self.utf()?;
            if cert_type != X509 {
                return Err(StoreError::UnsupportedCertType(cert_type));
            }
        }
        let len = self.u32()? as usize;
        Ok(self.bytes(len)?.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trusted(alias: &str, der: &[u8]) -> RawEntry {
        RawEntry {
            alias: alias.to_string(),
            created_ms: 1_700_000_000_000,
            body: RawBody::TrustedCert(der.to_vec()),
        }
    }

    #[test]
    fn test_empty_store_layout() {
        let bytes = encode(&[], "changeit").unwrap();
        assert_eq!(&bytes[..4], &[0xFE, 0xED, 0xFE, 0xED]);
        assert_eq!(&bytes[4..8], &[0, 0, 0, 2]);
        assert_eq!(&bytes[8..12], &[0, 0, 0, 0]);
        assert_eq!(bytes.len(), 12 + DIGEST_LEN);
        assert!(decode(&bytes, "changeit").unwrap().is_empty());
    }

    #[test]
    fn test_entries_survive() {
        let entries = vec![
            trusted("example.com-0", b"leaf"),
            RawEntry {
                alias: "server".to_string(),
                created_ms: 42,
                body: RawBody::PrivateKey {
                    protected_key: vec![1, 2, 3],
                    chain: vec![b"leaf".to_vec(), b"root".to_vec()],
                },
            },
        ];
        let bytes = encode(&entries, "secret").unwrap();
        assert_eq!(decode(&bytes, "secret").unwrap(), entries);
    }

    #[test]
    fn test_wrong_passphrase() {
        let bytes = encode(&[trusted("a", b"x")], "right").unwrap();
        assert!(matches!(
            decode(&bytes, "wrong"),
            Err(StoreError::IntegrityCheckFailed)
        ));
    }

    #[test]
    fn test_flipped_byte_detected() {
        let mut bytes = encode(&[trusted("a", b"xyz")], "changeit").unwrap();
        let last_body = bytes.len() - DIGEST_LEN - 1;
        bytes[last_body] ^= 0xFF;
        assert!(matches!(
            decode(&bytes, "changeit"),
            Err(StoreError::IntegrityCheckFailed)
        ));
    }

    #[test]
    fn test_truncated() {
        let bytes = encode(&[trusted("a", b"xyz")], "changeit").unwrap();
        assert!(matches!(
            decode(&bytes[..bytes.len() - 5], "changeit"),
            Err(StoreError::Truncated)
        ));
    }

    #[test]
    fn test_trailing_data() {
        let mut bytes = encode(&[], "changeit").unwrap();
        bytes.push(0);
        assert!(matches!(
            decode(&bytes, "changeit"),
            Err(StoreError::TrailingData)
        ));
    }

    #[test]
    fn test_foreign_formats() {
        let mut jceks = vec![0xCE, 0xCE, 0xCE, 0xCE];
        jceks.resize(64, 0);
        assert!(matches!(decode(&jceks, "x"), Err(StoreError::Jceks)));

        let garbage = vec![0x11; 64];
        assert!(matches!(decode(&garbage, "x"), Err(StoreError::BadMagic)));
    }

    #[test]
    fn test_version_1_has_no_cert_type() {
        let mut body = Vec::new();
        body.extend_from_slice(&MAGIC.to_be_bytes());
        body.extend_from_slice(&VERSION_1.to_be_bytes());
        body.extend_from_slice(&1u32.to_be_bytes());
        body.extend_from_slice(&TAG_TRUSTED_CERT.to_be_bytes());
        body.extend_from_slice(&1u16.to_be_bytes());
        body.push(b'a');
        body.extend_from_slice(&7u64.to_be_bytes());
        body.extend_from_slice(&3u32.to_be_bytes());
        body.extend_from_slice(b"der");
        let digest = integrity_digest("changeit", &body);
        body.extend_from_slice(&digest);

        let entries = decode(&body, "changeit").unwrap();
        assert_eq!(entries, vec![RawEntry {
            alias: "a".to_string(),
            created_ms: 7,
            body: RawBody::TrustedCert(b"der".to_vec()),
        }]);
    }

    #[test]
    fn test_modified_utf8() {
        for s in ["plain", "caf\u{e9}", "\u{4e2d}\u{6587}", "nul\u{0}byte", "emoji\u{1F512}"] {
            assert_eq!(decode_modified_utf8(&encode_modified_utf8(s)).unwrap(), s);
        }
        assert_eq!(encode_modified_utf8("\u{0}"), vec![0xC0, 0x80]);
        // Supplementary characters become two 3-byte surrogates.
        assert_eq!(encode_modified_utf8("\u{1F512}").len(), 6);
        assert!(decode_modified_utf8(&[0xC3]).is_err());
    }
}
