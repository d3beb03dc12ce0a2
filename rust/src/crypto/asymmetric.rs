//! RSA primitives used by seed provisioning and commit proofs.
//! OAEP and PSS both use SHA-256 for the hash and for MGF1; OAEP labels are
//! empty.

use std::fs;
use std::path::Path;

use rand::rngs::OsRng;
use rsa::pkcs1::{DecodeRsaPrivateKey, DecodeRsaPublicKey};
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey};
use rsa::traits::PublicKeyParts;
use rsa::{Oaep, Pss, RsaPrivateKey, RsaPublicKey};
use sha2::Sha256;
use thiserror::Error;

use crate::crypto::integrity::sha256_digest;

const SHA256_LEN: usize = 32;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("key load failed: {0}")]
    KeyLoad(String),
    #[error("decryption failed: {0}")]
    Decryption(String),
    #[error("encryption failed: {0}")]
    Encryption(String),
    #[error("signing failed: {0}")]
    Signing(String),
}

/// Reads a PEM private key from disk. Both PKCS#8 and PKCS#1 encodings are
/// accepted.
pub fn load_private_key(path: &Path) -> Result<RsaPrivateKey, CryptoError> {
    let pem = fs::read_to_string(path)
        .map_err(|e| CryptoError::KeyLoad(format!("{}: {e}", path.display())))?;
    private_key_from_pem(&pem)
}

/// Reads a PEM public key from disk. Both SPKI and PKCS#1 encodings are
/// accepted.
pub fn load_public_key(path: &Path) -> Result<RsaPublicKey, CryptoError> {
    let pem = fs::read_to_string(path)
        .map_err(|e| CryptoError::KeyLoad(format!("{}: {e}", path.display())))?;
    public_key_from_pem(&pem)
}

pub fn private_key_from_pem(pem: &str) -> Result<RsaPrivateKey, CryptoError> {
    let pem = pem.trim();
    match RsaPrivateKey::from_pkcs8_pem(pem) {
        Ok(key) => Ok(key),
        Err(pkcs8_err) => RsaPrivateKey::from_pkcs1_pem(pem).map_err(|pkcs1_err| {
            CryptoError::KeyLoad(format!("not PKCS#8 ({pkcs8_err}) nor PKCS#1 ({pkcs1_err})"))
        }),
    }
}

pub fn public_key_from_pem(pem: &str) -> Result<RsaPublicKey, CryptoError> {
    let pem = pem.trim();
    match RsaPublicKey::from_public_key_pem(pem) {
        Ok(key) => Ok(key),
        Err(spki_err) => RsaPublicKey::from_pkcs1_pem(pem).map_err(|pkcs1_err| {
            CryptoError::KeyLoad(format!("not SPKI ({spki_err}) nor PKCS#1 ({pkcs1_err})"))
        }),
    }
}

/// Largest plaintext OAEP-SHA256 can carry under this key.
pub fn max_oaep_payload(public_key: &RsaPublicKey) -> usize {
    public_key.size().saturating_sub(2 * SHA256_LEN + 2)
}

/// Largest PSS salt that fits the encoded message for this modulus.
fn max_pss_salt_len(public_key: &RsaPublicKey) -> usize {
    let em_bits = public_key.n().bits().saturating_sub(1);
    let em_len = (em_bits + 7) / 8;
    em_len.saturating_sub(SHA256_LEN + 2)
}

pub fn decrypt_oaep_sha256(private_key: &RsaPrivateKey, ciphertext: &[u8]) -> Result<Vec<u8>, CryptoError> {
    private_key
        .decrypt(Oaep::new::<Sha256>(), ciphertext)
        .map_err(|e| CryptoError::Decryption(format!("{e}")))
}

pub fn encrypt_oaep_sha256(public_key: &RsaPublicKey, plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let limit = max_oaep_payload(public_key);
    if plaintext.len() > limit {
        return Err(CryptoError::Encryption(format!(
            "payload of {} bytes exceeds the {limit} byte limit for a {}-bit key",
            plaintext.len(),
            public_key.n().bits()
        )));
    }
    public_key
        .encrypt(&mut OsRng, Oaep::new::<Sha256>(), plaintext)
        .map_err(|e| CryptoError::Encryption(format!("{e}")))
}

/// Signs `message` with RSA-PSS over SHA-256 using the maximum salt length.
/// The salt is random, so two signatures over the same message differ.
pub fn sign_pss_sha256(private_key: &RsaPrivateKey, message: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let digest = sha256_digest(message);
    let salt_len = max_pss_salt_len(&private_key.to_public_key());
    private_key
        .sign_with_rng(&mut OsRng, Pss::new_with_salt::<Sha256>(salt_len), &digest)
        .map_err(|e| CryptoError::Signing(format!("{e}")))
}

/// Checks a PSS-SHA256 signature. Signatures salted with either the maximum
/// length or the digest length are accepted. Any mismatch yields `false`.
pub fn verify_pss_sha256(public_key: &RsaPublicKey, message: &[u8], signature: &[u8]) -> bool {
    let digest = sha256_digest(message);
    let max_salt = max_pss_salt_len(public_key);
    let verified_with = |salt_len: usize| {
        public_key
            .verify(Pss::new_with_salt::<Sha256>(salt_len), &digest, signature)
            .is_ok()
    };
    verified_with(max_salt) || (max_salt != SHA256_LEN && verified_with(SHA256_LEN))
}
