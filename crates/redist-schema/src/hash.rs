//! SHA-256 content digests.
//!
//! Every "did this file change" decision in redist-sync comes down to comparing
//! two [`Sha256Digest`] values, so the digest is always the lowercase hex
//! encoding of the exact bytes.

use serde::{Deserialize, Deserializer, Serialize};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use thiserror::Error;

/// Size of the read buffer used when hashing files.
const READ_BUFFER_SIZE: usize = 65536;

/// Returned when a string is not a valid SHA-256 hex digest.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid SHA256 digest: {reason} in '{input}'")]
pub struct InvalidDigest {
    input: String,
    reason: String,
}

/// A validated SHA256 digest (64 lowercase hex characters).
///
/// Deserialization validates the value, so a manifest or state file with a
/// malformed digest is rejected at load time instead of silently comparing
/// unequal later.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Sha256Digest(String);

impl Sha256Digest {
    /// Create a new `Sha256Digest`, validating the input.
    ///
    /// Accepts strings with or without a `sha256:` prefix and normalizes the
    /// hex to lowercase.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidDigest`] if the hex portion is not exactly 64 ASCII hex
    /// characters.
    pub fn new(s: impl Into<String>) -> Result<Self, InvalidDigest> {
        let s = s.into();
        let hex = s.strip_prefix("sha256:").unwrap_or(&s);

        if hex.len() != 64 {
            return Err(InvalidDigest {
                reason: format!("expected 64 hex characters, got {}", hex.len()),
                input: s,
            });
        }

        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(InvalidDigest {
                reason: "contains non-hex characters".to_string(),
                input: s,
            });
        }

        Ok(Self(hex.to_lowercase()))
    }

    /// Compute the digest of an in-memory buffer.
    pub fn compute(data: &[u8]) -> Self {
        Self(hex::encode(Sha256::digest(data)))
    }

    /// Compute the digest of a file, reading it in 64KB chunks.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error if the file cannot be opened or read.
    pub fn compute_file(path: &Path) -> io::Result<Self> {
        let mut file = File::open(path)?;
        let mut hasher = Sha256::new();
        let mut buffer = vec![0u8; READ_BUFFER_SIZE];

        loop {
            let bytes_read = file.read(&mut buffer)?;
            if bytes_read == 0 {
                break;
            }
            hasher.update(&buffer[..bytes_read]);
        }

        Ok(Self::compute_from_hasher(hasher))
    }

    /// Finish a running hasher into a digest.
    pub(crate) fn compute_from_hasher(hasher: Sha256) -> Self {
        Self(hex::encode(hasher.finalize()))
    }

    /// Get the digest as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for Sha256Digest {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::new(s).map_err(serde::de::Error::custom)
    }
}

impl std::fmt::Display for Sha256Digest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Sha256Digest {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::str::FromStr for Sha256Digest {
    type Err = InvalidDigest;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// Digest of a byte buffer.
pub fn digest(data: &[u8]) -> Sha256Digest {
    Sha256Digest::compute(data)
}

/// Digest of a file's current content.
///
/// # Errors
///
/// Returns the underlying I/O error if the file cannot be opened or read.
pub fn digest_file(path: &Path) -> io::Result<Sha256Digest> {
    Sha256Digest::compute_file(path)
}
