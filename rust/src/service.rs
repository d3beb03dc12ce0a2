//! Request/response surface of the service, independent of any transport.
//!
//! Request and response bodies serialize to the JSON shapes clients expect.
//! Failures are coarse: the caller learns that provisioning or
//! proof issuing failed, never why. The detailed cause goes to the log.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::RuntimeConfig;
use crate::crypto::asymmetric::{load_private_key, load_public_key};
use crate::crypto::totp::TotpEngine;
use crate::proof::CommitProofIssuer;
use crate::seed::provision::SeedProvisioner;
use crate::seed::store::{FileSeedStore, SeedStore};
use crate::seed::{Seed, SeedError};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("missing {0}")]
    MissingField(&'static str),
    #[error("decryption failed")]
    ProvisioningFailed,
    #[error("seed not decrypted yet")]
    SeedNotProvisioned,
    #[error("commit proof could not be issued")]
    ProofFailed,
    #[error("internal error")]
    Internal,
}

impl ServiceError {
    /// HTTP status a web binding should answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            ServiceError::MissingField(_) => 400,
            _ => 500,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisionRequest {
    pub encrypted_seed: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyRequest {
    pub code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
}

impl StatusResponse {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeResponse {
    pub code: String,
    pub valid_for: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyResponse {
    pub valid: bool,
}

pub struct CredentialService<S: SeedStore> {
    config: RuntimeConfig,
    store: S,
    engine: TotpEngine,
}

impl CredentialService<FileSeedStore> {
    /// Service backed by the seed file named in `config`.
    pub fn from_config(config: RuntimeConfig) -> Self {
        let store = FileSeedStore::new(config.seed_path.clone());
        Self::new(config, store)
    }
}

impl<S: SeedStore> CredentialService<S> {
    pub fn new(config: RuntimeConfig, store: S) -> Self {
        Self {
            config,
            store,
            engine: TotpEngine::new(),
        }
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn health(&self) -> StatusResponse {
        StatusResponse::ok()
    }

    pub fn provision_seed(&self, request: ProvisionRequest) -> Result<StatusResponse, ServiceError> {
        let encrypted_seed = request
            .encrypted_seed
            .filter(|value| !value.is_empty())
            .ok_or(ServiceError::MissingField("encrypted_seed"))?;

        let outcome = load_private_key(&self.config.private_key_path)
            .map_err(SeedError::from)
            .and_then(|key| SeedProvisioner::new(&self.store).provision(&encrypted_seed, &key));
        match outcome {
            Ok(()) => Ok(StatusResponse::ok()),
            Err(err) => {
                tracing::warn!(error = %err, "seed provisioning rejected");
                Err(ServiceError::ProvisioningFailed)
            }
        }
    }

    pub fn generate_code(&self, now_unix_seconds: i64) -> Result<CodeResponse, ServiceError> {
        let seed = self.current_seed()?;
        let generated = self.engine.generate(&seed, now_unix_seconds).map_err(|err| {
            tracing::warn!(error = %err, "code generation failed");
            ServiceError::Internal
        })?;
        Ok(CodeResponse {
            code: generated.code.into_string(),
            valid_for: generated.seconds_remaining,
        })
    }

    pub fn verify_code(&self, request: VerifyRequest, now_unix_seconds: i64) -> Result<VerifyResponse, ServiceError> {
        let code = request.code.ok_or(ServiceError::MissingField("code"))?;
        let seed = self.current_seed()?;
        let valid = self
            .engine
            .verify(&seed, &code, now_unix_seconds, self.config.window_steps);
        Ok(VerifyResponse { valid })
    }

    /// Signs `commit_hash` with this service's key and seals it for the
    /// configured verifier.
    pub fn issue_commit_proof(&self, commit_hash: &str) -> Result<String, ServiceError> {
        if commit_hash.trim().is_empty() {
            return Err(ServiceError::MissingField("commit_hash"));
        }
        let outcome = load_private_key(&self.config.private_key_path).and_then(|signer| {
            load_public_key(&self.config.verifier_public_key_path).map(|verifier| (signer, verifier))
        });
        let (signer, verifier) = outcome.map_err(|err| {
            tracing::warn!(error = %err, "commit proof keys unavailable");
            ServiceError::ProofFailed
        })?;
        CommitProofIssuer::new(&signer, &verifier)
            .issue(commit_hash)
            .map(|proof| proof.into_string())
            .map_err(|err| {
                tracing::warn!(error = %err, "commit proof rejected");
                ServiceError::ProofFailed
            })
    }

    fn current_seed(&self) -> Result<Seed, ServiceError> {
        self.store.read().map_err(|err| match err {
            SeedError::NotProvisioned => ServiceError::SeedNotProvisioned,
            other => {
                tracing::warn!(error = %other, "stored seed unreadable");
                ServiceError::Internal
            }
        })
    }
}
