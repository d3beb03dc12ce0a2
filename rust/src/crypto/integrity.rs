//! Hashing, MAC and comparison helpers shared by the signature and one-time
//! code paths. Kept apart from the RSA code so each primitive has exactly one
//! home.

use hmac::{Hmac, Mac};
use sha1::Sha1;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IntegrityError {
    #[error("hmac failed: {0}")]
    HmacFailed(String),
}

type HmacSha1 = Hmac<Sha1>;

/// Produces a raw SHA-256 digest of the provided bytes.
pub fn sha256_digest(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Returns the hexadecimal representation of a SHA-256 digest.
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(sha256_digest(data))
}

/// HMAC-SHA1 tag, the MAC RFC 6238 codes are truncated from.
pub fn hmac_sha1(key: &[u8], data: &[u8]) -> Result<[u8; 20], IntegrityError> {
    let mut mac = HmacSha1::new_from_slice(key)
        .map_err(|e| IntegrityError::HmacFailed(format!("{e}")))?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().into())
}

/// Byte comparison whose running time does not depend on where the inputs
/// differ. Inputs of different length compare unequal.
pub fn constant_time_eq(left: &[u8], right: &[u8]) -> bool {
    left.ct_eq(right).into()
}
