//! Seed provisioning, time-based one-time codes and commit proofs.
//!
//! An RSA-OAEP encrypted seed is decrypted with the service key and stored;
//! six digit codes are derived from it on demand. Separately, commit hashes
//! are signed with RSA-PSS and sealed for a verifier with RSA-OAEP.

pub mod config;
pub mod crypto;
pub mod proof;
pub mod seed;
pub mod service;

#[cfg(test)]
pub(crate) mod testdata;
