//! Configuration loader. A JSON file names where the key material and the
//! seed live; anything it leaves out falls back to the stock deployment
//! layout.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::crypto::totp::{DEFAULT_WINDOW_STEPS, MAX_WINDOW_STEPS};

/// Environment variable naming the config file.
pub const CONFIG_ENV_VAR: &str = "SEEDKEEPER_CONFIG";
/// Looked up in the working directory when `SEEDKEEPER_CONFIG` is unset.
pub const DEFAULT_CONFIG_FILE: &str = "seedkeeper.json";

const DEFAULT_PRIVATE_KEY_PATH: &str = "student_private.pem";
const DEFAULT_VERIFIER_PUBLIC_KEY_PATH: &str = "instructor_public.pem";
const DEFAULT_SEED_PATH: &str = "/data/seed.txt";
const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file unreadable: {0}")]
    Io(String),
    #[error("config parse failed: {0}")]
    Parse(String),
    #[error("invalid config value: {0}")]
    Invalid(String),
}

#[derive(Debug, Default, Deserialize)]
pub struct RawServiceConfig {
    #[serde(rename = "privateKeyPath")]
    pub private_key_path: Option<PathBuf>,
    #[serde(rename = "verifierPublicKeyPath")]
    pub verifier_public_key_path: Option<PathBuf>,
    #[serde(rename = "seedPath")]
    pub seed_path: Option<PathBuf>,
    #[serde(rename = "windowSteps")]
    pub window_steps: Option<u32>,
    #[serde(rename = "logLevel")]
    pub log_level: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// This service's private key: decrypts seeds and signs commit proofs.
    pub private_key_path: PathBuf,
    /// Public key of whoever receives commit proofs.
    pub verifier_public_key_path: PathBuf,
    pub seed_path: PathBuf,
    pub window_steps: u32,
    pub log_level: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            private_key_path: PathBuf::from(DEFAULT_PRIVATE_KEY_PATH),
            verifier_public_key_path: PathBuf::from(DEFAULT_VERIFIER_PUBLIC_KEY_PATH),
            seed_path: PathBuf::from(DEFAULT_SEED_PATH),
            window_steps: DEFAULT_WINDOW_STEPS,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl RuntimeConfig {
    /// Fills gaps from the defaults. Relative paths are taken relative to
    /// `base_dir`, the directory holding the config file.
    fn resolve(raw: RawServiceConfig, base_dir: &Path) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let window_steps = raw.window_steps.unwrap_or(defaults.window_steps);
        if window_steps > MAX_WINDOW_STEPS {
            return Err(ConfigError::Invalid(format!(
                "windowSteps {window_steps} exceeds the maximum of {MAX_WINDOW_STEPS}"
            )));
        }
        let anchor = |path: Option<PathBuf>, fallback: PathBuf| base_dir.join(path.unwrap_or(fallback));

        Ok(Self {
            private_key_path: anchor(raw.private_key_path, defaults.private_key_path),
            verifier_public_key_path: anchor(raw.verifier_public_key_path, defaults.verifier_public_key_path),
            seed_path: anchor(raw.seed_path, defaults.seed_path),
            window_steps,
            log_level: raw.log_level.unwrap_or(defaults.log_level),
        })
    }
}

/// Loads and resolves the JSON configuration file at `path`.
pub fn load_config(path: impl AsRef<Path>) -> Result<RuntimeConfig, ConfigError> {
    let path = path.as_ref();
    let raw_json = fs::read_to_string(path).map_err(|e| ConfigError::Io(format!("{}: {e}", path.display())))?;
    let raw_config: RawServiceConfig =
        serde_json::from_str(&raw_json).map_err(|e| ConfigError::Parse(format!("{e}")))?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new(""));
    RuntimeConfig::resolve(raw_config, base_dir)
}

/// Honors `SEEDKEEPER_CONFIG`, then `seedkeeper.json` in the working
/// directory, then the defaults.
pub fn load_from_env() -> Result<RuntimeConfig, ConfigError> {
    if let Ok(path) = env::var(CONFIG_ENV_VAR) {
        return load_config(path);
    }
    let local = Path::new(DEFAULT_CONFIG_FILE);
    if local.is_file() {
        return load_config(local);
    }
    Ok(RuntimeConfig::default())
}
