//! Certificate fingerprints.
//!
//! A fingerprint is the SHA-256 digest of a DER-encoded certificate.  Two
//! spellings show up in practice: bare hex (`98d82456…`) and the
//! colon-delimited uppercase form printed by `openssl x509 -fingerprint`
//! (`98:D8:24:56:…`).  Both the configured allow-list and the fingerprints
//! computed at runtime go through [`Fingerprint::normalize`], so they always
//! meet in one canonical encoding: lowercase hex, no separators.

use std::fmt;

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::{Error, Result};

/// Hex length of a SHA-256 digest.
const SHA256_HEX_LEN: usize = 64;

/// A fingerprint in canonical encoding (lowercase hex, no separators).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Compute the SHA-256 fingerprint of a DER-encoded certificate.
    #[must_use]
    pub fn sha256(der: &[u8]) -> Self {
        Self(hex::encode(Sha256::digest(der)))
    }

    /// Parse a configured fingerprint.
    ///
    /// Accepts bare or colon-delimited hex in any case.  Surrounding
    /// whitespace is ignored.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the value is empty, contains anything other
    /// than hex digits and `:` separators, or has an odd number of digits.
    pub fn parse(value: &str) -> Result<Self> {
        let normalized = Self::normalize(value);

        if normalized.is_empty() {
            return Err(Error::Config("Empty fingerprint".to_string()));
        }
        if !normalized.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(Error::Config(format!(
                "Fingerprint '{value}' contains non-hex characters"
            )));
        }
        if normalized.len() % 2 != 0 {
            return Err(Error::Config(format!(
                "Fingerprint '{value}' has an odd number of hex digits"
            )));
        }

        Ok(Self(normalized))
    }

    /// Parse a configured allow-list entry, which must be a SHA-256 digest.
    ///
    /// # Errors
    ///
    /// Everything [`Fingerprint::parse`] rejects, plus any digest that is not
    /// 32 bytes long (e.g. a 20-byte SHA-1 fingerprint).
    pub fn parse_sha256(value: &str) -> Result<Self> {
        let fingerprint = Self::parse(value)?;
        let bytes = fingerprint.0.len() / 2;

        if fingerprint.0.len() != SHA256_HEX_LEN {
            return Err(Error::Config(format!(
                "Fingerprint '{value}' is {bytes} bytes; expected a 32-byte SHA-256 digest"
            )));
        }

        Ok(fingerprint)
    }

    /// Normalize any fingerprint spelling to the canonical encoding.
    ///
    /// Total: never fails.  Malformed input simply produces a string that no
    /// parsed [`Fingerprint`] can equal.
    #[must_use]
    pub fn normalize(value: &str) -> String {
        value
            .trim()
            .chars()
            .filter(|c| *c != ':')
            .map(|c| c.to_ascii_lowercase())
            .collect()
    }

    /// The canonical encoding.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Render as colon-delimited uppercase pairs (`AB:CD:…`).
    #[must_use]
    pub fn to_colon_hex(&self) -> String {
        self.0
            .as_bytes()
            .chunks(2)
            .map(|pair| String::from_utf8_lossy(pair).to_ascii_uppercase())
            .collect::<Vec<_>>()
            .join(":")
    }

    /// Compare against an already-normalized value in constant time.
    #[must_use]
    pub fn ct_matches(&self, normalized: &str) -> bool {
        let a = self.0.as_bytes();
        let b = normalized.as_bytes();
        if a.len() != b.len() {
            return false;
        }
        a.ct_eq(b).into()
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
