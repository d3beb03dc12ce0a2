//! Cryptographic building blocks. RSA lives in `asymmetric`, hashes and MACs
//! in `integrity`, and one-time codes in `totp`; each submodule keeps to that
//! one job.

pub mod asymmetric;
pub mod integrity;
pub mod totp;
