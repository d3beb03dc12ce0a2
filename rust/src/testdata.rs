//! Fixture access for unit tests. The PEM keys and base64 blobs under
//! `testdata/` were produced with OpenSSL and an independent OAEP/PSS
//! implementation, so they double as interoperability checks.

use std::fs;
use std::path::{Path, PathBuf};

use base64::{engine::general_purpose::STANDARD, Engine};
use rsa::{RsaPrivateKey, RsaPublicKey};

use crate::crypto::asymmetric::{load_private_key, load_public_key};

/// Plaintext inside `encrypted_seed.b64`.
pub const PROVISIONED_SEED: &str = "4f1c9d2e7a3b8c6d5e0f1a2b3c4d5e6f708192a3b4c5d6e7f8091a2b3c4d5e6f";

pub fn path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("testdata").join(name)
}

pub fn text_fixture(name: &str) -> String {
    fs::read_to_string(path(name)).expect("fixture should be readable")
}

pub fn base64_fixture(name: &str) -> Vec<u8> {
    STANDARD
        .decode(text_fixture(name).trim())
        .expect("fixture should be base64")
}

/// 2048-bit, PKCS#8.
pub fn service_private_key() -> RsaPrivateKey {
    load_private_key(&path("service_private.pem")).expect("service key")
}

pub fn service_public_key() -> RsaPublicKey {
    load_public_key(&path("service_public.pem")).expect("service public key")
}

/// 2048-bit, PKCS#1.
pub fn signer_private_key() -> RsaPrivateKey {
    load_private_key(&path("signer_private.pem")).expect("signer key")
}

pub fn signer_public_key() -> RsaPublicKey {
    load_public_key(&path("signer_public.pem")).expect("signer public key")
}

/// 4096-bit, PKCS#8.
pub fn verifier_private_key() -> RsaPrivateKey {
    load_private_key(&path("verifier_private.pem")).expect("verifier key")
}

pub fn verifier_public_key() -> RsaPublicKey {
    load_public_key(&path("verifier_public.pem")).expect("verifier public key")
}
