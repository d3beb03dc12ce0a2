//! Sign-then-encrypt commit proofs.
//!
//! The signer signs the commit hash with RSA-PSS, then encrypts the signature
//! under the verifier's public key with RSA-OAEP. Only the verifier can open
//! the proof, and only the signer could have produced the signature inside.
//! The verifier key has to be large enough to carry a whole signature: a
//! 2048-bit signer needs at least a 3072-bit verifier.

use std::fmt;

use base64::{engine::general_purpose::STANDARD, Engine};
use rsa::{RsaPrivateKey, RsaPublicKey};
use thiserror::Error;

use crate::crypto::asymmetric::{
    decrypt_oaep_sha256, encrypt_oaep_sha256, sign_pss_sha256, verify_pss_sha256, CryptoError,
};

#[derive(Debug, Error)]
pub enum ProofError {
    #[error(transparent)]
    Crypto(#[from] CryptoError),
    #[error("malformed proof: {0}")]
    MalformedInput(String),
}

/// Single-line base64 of the encrypted signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitProof(String);

impl CommitProof {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for CommitProof {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub struct CommitProofIssuer<'a> {
    signer: &'a RsaPrivateKey,
    verifier: &'a RsaPublicKey,
}

impl<'a> CommitProofIssuer<'a> {
    pub fn new(signer: &'a RsaPrivateKey, verifier: &'a RsaPublicKey) -> Self {
        Self { signer, verifier }
    }

    /// Produces a proof for `commit_hash`. The proof is not checked locally;
    /// that is the verifier's job.
    pub fn issue(&self, commit_hash: &str) -> Result<CommitProof, ProofError> {
        let signature = sign_pss_sha256(self.signer, commit_hash.as_bytes())?;
        let sealed = encrypt_oaep_sha256(self.verifier, &signature)?;
        tracing::info!(commit = commit_hash, "commit proof issued");
        Ok(CommitProof(STANDARD.encode(sealed)))
    }
}

/// Verifier side of [`CommitProofIssuer::issue`]: decrypts the proof and
/// checks the signature against `commit_hash`. A signature that does not
/// match is `Ok(false)`; only undecodable or undecryptable proofs are errors.
pub fn open_commit_proof(
    proof_b64: &str,
    commit_hash: &str,
    verifier: &RsaPrivateKey,
    signer: &RsaPublicKey,
) -> Result<bool, ProofError> {
    let sealed = STANDARD
        .decode(proof_b64.trim().as_bytes())
        .map_err(|e| ProofError::MalformedInput(format!("{e}")))?;
    let signature = decrypt_oaep_sha256(verifier, &sealed)?;
    Ok(verify_pss_sha256(signer, commit_hash.as_bytes(), &signature))
}
