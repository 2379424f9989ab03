//! Content fingerprints: 128-bit MD5 digests of raw document text.
//!
//! # Invariants
//! - The digest is computed over the raw UTF-8 bytes of `text`. No case
//!   folding, no whitespace normalization; byte equality is the only
//!   similarity notion.
//! - The hex form is always exactly 32 digits. Encoding emits lowercase;
//!   parsing accepts either case.
//!
//! Blocklist files produced by older MD5-based hashing tools load unchanged.

use std::fmt;

/// Digest width in bytes.
pub const FINGERPRINT_LEN: usize = 16;

/// A 128-bit content digest used as the deduplication key.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint([u8; FINGERPRINT_LEN]);

/// Rejection reason for a line that is not a hex-encoded fingerprint.
#[derive(Debug, thiserror::Error)]
#[error("expected {} hex digits, got {0:?}", FINGERPRINT_LEN * 2)]
pub struct ParseFingerprintError(pub String);

impl Fingerprint {
    /// Fingerprints a document's text.
    pub fn of_text(text: &str) -> Self {
        Self(md5::compute(text.as_bytes()).0)
    }

    pub fn from_bytes(bytes: [u8; FINGERPRINT_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; FINGERPRINT_LEN] {
        &self.0
    }

    /// Parses the hex form. Rejects anything that is not exactly 32 hex
    /// digits (no whitespace trimming here; callers trim line endings).
    pub fn parse_hex(s: &str) -> Result<Self, ParseFingerprintError> {
        let raw = s.as_bytes();
        if raw.len() != FINGERPRINT_LEN * 2 {
            return Err(ParseFingerprintError(s.to_string()));
        }
        let mut bytes = [0u8; FINGERPRINT_LEN];
        for (i, pair) in raw.chunks_exact(2).enumerate() {
            let hi = hex_val(pair[0]).ok_or_else(|| ParseFingerprintError(s.to_string()))?;
            let lo = hex_val(pair[1]).ok_or_else(|| ParseFingerprintError(s.to_string()))?;
            bytes[i] = (hi << 4) | lo;
        }
        Ok(Self(bytes))
    }

    /// Lowercase 32-digit hex form, the blocklist wire format.
    pub fn to_hex(&self) -> String {
        let mut out = String::with_capacity(FINGERPRINT_LEN * 2);
        for b in &self.0 {
            out.push(HEX_DIGITS[(b >> 4) as usize] as char);
            out.push(HEX_DIGITS[(b & 0xf) as usize] as char);
        }
        out
    }
}

const HEX_DIGITS: &[u8; 16] = b"0123456789abcdef";

fn hex_val(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({})", self.to_hex())
    }
}
