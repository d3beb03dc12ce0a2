//! RFC 6238 time-based one-time codes: HMAC-SHA1, 30 second steps, six
//! digits. Codes are compared as digit strings, so leading zeros matter.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use thiserror::Error;
use totp_rs::{Rfc6238, TOTP};

use crate::crypto::integrity::{constant_time_eq, hmac_sha1, IntegrityError};
use crate::seed::Seed;

pub const TIME_STEP_SECONDS: i64 = 30;
pub const CODE_DIGITS: usize = 6;
/// Accept codes one step either side of the current one (±30 seconds).
pub const DEFAULT_WINDOW_STEPS: u32 = 1;
/// Larger windows are clamped to this many steps.
pub const MAX_WINDOW_STEPS: u32 = 10;

#[derive(Debug, Error)]
pub enum TotpError {
    #[error("totp parameters rejected: {0}")]
    Parameters(String),
    #[error(transparent)]
    Integrity(#[from] IntegrityError),
}

/// A zero-padded six digit code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TotpCode(String);

impl TotpCode {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for TotpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedCode {
    pub code: TotpCode,
    /// Seconds until the current step ends, always in `1..=30`.
    pub seconds_remaining: u32,
}

/// Stateless code generator and checker.
#[derive(Debug, Clone, Copy, Default)]
pub struct TotpEngine;

impl TotpEngine {
    pub fn new() -> Self {
        Self
    }

    pub fn generate(&self, seed: &Seed, now_unix_seconds: i64) -> Result<GeneratedCode, TotpError> {
        let totp = totp_for(seed)?;
        let code = code_at_step(&totp, now_unix_seconds.div_euclid(TIME_STEP_SECONDS))?;
        let elapsed = now_unix_seconds.rem_euclid(TIME_STEP_SECONDS);
        // elapsed is in 0..30, so the difference always fits
        let seconds_remaining = (TIME_STEP_SECONDS - elapsed) as u32;
        tracing::debug!(seconds_remaining, "generated one-time code");
        Ok(GeneratedCode {
            code,
            seconds_remaining,
        })
    }

    /// Returns whether `submitted` matches any step within `window_steps` of
    /// the current one, with the window clamped to [`MAX_WINDOW_STEPS`].
    /// Every candidate step is computed and compared so the running time does
    /// not reveal which step matched.
    pub fn verify(&self, seed: &Seed, submitted: &str, now_unix_seconds: i64, window_steps: u32) -> bool {
        if !is_well_formed(submitted) {
            return false;
        }
        let totp = match totp_for(seed) {
            Ok(totp) => totp,
            Err(err) => {
                tracing::warn!(error = %err, "one-time code setup failed");
                return false;
            }
        };
        let current = now_unix_seconds.div_euclid(TIME_STEP_SECONDS);
        let window = i64::from(window_steps.min(MAX_WINDOW_STEPS));
        let mut matched = false;
        for step in current.saturating_sub(window)..=current.saturating_add(window) {
            match code_at_step(&totp, step) {
                Ok(candidate) => matched |= constant_time_eq(candidate.as_str().as_bytes(), submitted.as_bytes()),
                Err(err) => {
                    tracing::warn!(error = %err, "one-time code derivation failed");
                    return false;
                }
            }
        }
        matched
    }
}

/// Current Unix time in whole seconds.
pub fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_secs()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}

fn is_well_formed(submitted: &str) -> bool {
    submitted.len() == CODE_DIGITS && submitted.bytes().all(|b| b.is_ascii_digit())
}

/// SHA-1, six digits, 30 second steps.
fn totp_for(seed: &Seed) -> Result<TOTP, TotpError> {
    let rfc = Rfc6238::new(CODE_DIGITS, seed.as_bytes().to_vec()).map_err(|e| TotpError::Parameters(format!("{e}")))?;
    TOTP::from_rfc6238(rfc).map_err(|e| TotpError::Parameters(format!("{e}")))
}

/// `TOTP::generate` takes an unsigned time, so steps before the epoch go
/// through [`hotp`] with the step's two's complement bit pattern as counter.
fn code_at_step(totp: &TOTP, step: i64) -> Result<TotpCode, TotpError> {
    let step_start = u64::try_from(step)
        .ok()
        .and_then(|step| step.checked_mul(TIME_STEP_SECONDS as u64));
    match step_start {
        Some(time) => Ok(TotpCode(totp.generate(time))),
        None => Ok(hotp(&totp.secret, step as u64)?),
    }
}

/// HOTP (RFC 4226) truncated to [`CODE_DIGITS`].
fn hotp(key: &[u8], counter: u64) -> Result<TotpCode, IntegrityError> {
    let mac = hmac_sha1(key, &counter.to_be_bytes())?;
    let offset = usize::from(mac[mac.len() - 1] & 0x0f);
    let truncated = u32::from_be_bytes([mac[offset], mac[offset + 1], mac[offset + 2], mac[offset + 3]]) & 0x7fff_ffff;
    let value = truncated % 10u32.pow(CODE_DIGITS as u32);
    Ok(TotpCode(format!("{value:0width$}", width = CODE_DIGITS)))
}
