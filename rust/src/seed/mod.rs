//! Seed lifecycle: the validated seed value, where it is stored, and the one
//! path that is allowed to write it.

pub mod provision;
pub mod store;

use std::fmt;

use thiserror::Error;
use zeroize::Zeroize;

use crate::crypto::asymmetric::CryptoError;

const SEED_BYTES: usize = 32;

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("malformed input: {0}")]
    MalformedInput(String),
    #[error(transparent)]
    Crypto(#[from] CryptoError),
    #[error("seed is not valid utf-8: {0}")]
    Encoding(String),
    #[error("invalid seed: {0}")]
    InvalidSeed(String),
    #[error("seed has not been provisioned")]
    NotProvisioned,
    #[error("seed storage failed: {0}")]
    Storage(String),
}

/// A 32-byte shared secret in its 64-character hexadecimal form.
///
/// A `Seed` can only be built through [`Seed::parse`], so holding one means
/// the value already passed validation.
#[derive(Clone, PartialEq, Eq)]
pub struct Seed {
    hex: String,
    bytes: [u8; SEED_BYTES],
}

impl Seed {
    pub const BYTE_LEN: usize = SEED_BYTES;
    pub const HEX_LEN: usize = 64;

    pub fn parse(text: &str) -> Result<Self, SeedError> {
        let length = text.chars().count();
        if length != Self::HEX_LEN {
            return Err(SeedError::InvalidSeed(format!(
                "expected {} characters, got {length}",
                Self::HEX_LEN
            )));
        }
        let mut bytes = [0u8; Self::BYTE_LEN];
        hex::decode_to_slice(text, &mut bytes)
            .map_err(|e| SeedError::InvalidSeed(format!("{e}")))?;
        Ok(Self {
            hex: text.to_string(),
            bytes,
        })
    }

    pub fn as_hex(&self) -> &str {
        &self.hex
    }

    pub fn as_bytes(&self) -> &[u8; Self::BYTE_LEN] {
        &self.bytes
    }
}

impl fmt::Debug for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Seed").field("hex", &"<redacted>").finish()
    }
}

impl Drop for Seed {
    fn drop(&mut self) {
        self.hex.zeroize();
        self.bytes.zeroize();
    }
}

#[cfg(test)]
mod tests {
    use super::{Seed, SeedError};

    #[test]
    fn parses_64_hex_characters() {
        let seed = Seed::parse(&"a".repeat(64)).expect("valid seed");
        assert_eq!(seed.as_bytes(), &[0xaa; 32]);
        assert_eq!(seed.as_hex(), "a".repeat(64));
    }

    #[test]
    fn accepts_uppercase_hex() {
        let seed = Seed::parse(&"AB".repeat(32)).expect("valid seed");
        assert_eq!(seed.as_bytes(), &[0xab; 32]);
    }

    #[test]
    fn rejects_wrong_length() {
        for text in ["", "abc123", &"a".repeat(63), &"a".repeat(65)] {
            let err = Seed::parse(text).unwrap_err();
            assert!(matches!(err, SeedError::InvalidSeed(_)), "{text:?}");
        }
    }

    #[test]
    fn rejects_non_hex_of_the_right_length() {
        let err = Seed::parse(&"z".repeat(64)).unwrap_err();
        assert!(matches!(err, SeedError::InvalidSeed(_)));
        // 64 characters but multi-byte, so never mistaken for valid hex
        let err = Seed::parse(&"é".repeat(64)).unwrap_err();
        assert!(matches!(err, SeedError::InvalidSeed(_)));
    }

    #[test]
    fn debug_output_is_redacted() {
        let seed = Seed::parse(&"a".repeat(64)).expect("valid seed");
        let printed = format!("{seed:?}");
        assert!(!printed.contains("aaaa"));
        assert!(printed.contains("redacted"));
    }
}
