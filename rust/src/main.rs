//! Command-line shell over the credential service. Each command prints the
//! JSON body a client of the service would receive; logs go to stderr.

use std::env;
use std::fs;
use std::path::Path;
use std::process::{Command, ExitCode};

use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use seedkeeper::config::load_from_env;
use seedkeeper::crypto::asymmetric::{load_private_key, load_public_key};
use seedkeeper::crypto::totp::unix_now;
use seedkeeper::proof::open_commit_proof;
use seedkeeper::service::{CredentialService, ProvisionRequest, ServiceError, VerifyRequest};
use tracing_subscriber::EnvFilter;

fn print_usage() -> ExitCode {
    eprintln!("Commands:\n  health\n  provision-seed <base64 | @file>\n  generate-code\n  verify-code <code>\n  issue-commit-proof [commit-hash]\n  open-commit-proof <proof | @file> <commit-hash> <verifier-private.pem> <signer-public.pem>\n  log-code");
    ExitCode::from(2)
}

fn init_logging(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn print_json<T: Serialize>(value: &T) -> ExitCode {
    match serde_json::to_string(value) {
        Ok(text) => {
            println!("{text}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("response encoding failed: {err}");
            ExitCode::FAILURE
        }
    }
}

fn report(err: ServiceError) -> ExitCode {
    eprintln!("{}", json!({ "status_code": err.status_code(), "detail": err.to_string() }));
    ExitCode::FAILURE
}

/// `@path` reads the value from a file, anything else is taken literally.
fn read_argument(value: &str) -> Result<String, String> {
    match value.strip_prefix('@') {
        Some(path) => fs::read_to_string(path)
            .map(|text| text.trim().to_string())
            .map_err(|e| format!("{path}: {e}")),
        None => Ok(value.to_string()),
    }
}

fn head_commit() -> Result<String, String> {
    let output = Command::new("git")
        .args(["rev-parse", "HEAD"])
        .output()
        .map_err(|e| format!("git unavailable: {e}"))?;
    if !output.status.success() {
        return Err(String::from_utf8_lossy(&output.stderr).trim().to_string());
    }
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        return print_usage();
    }

    let config = match load_from_env() {
        Ok(cfg) => cfg,
        Err(err) => {
            eprintln!("config load failed: {err}");
            return ExitCode::FAILURE;
        }
    };
    init_logging(&config.log_level);
    let service = CredentialService::from_config(config);

    match args[1].as_str() {
        "health" => print_json(&service.health()),
        "provision-seed" => {
            if args.len() != 3 {
                return print_usage();
            }
            let encrypted_seed = match read_argument(&args[2]) {
                Ok(value) => value,
                Err(err) => {
                    eprintln!("input unreadable: {err}");
                    return ExitCode::FAILURE;
                }
            };
            let request = ProvisionRequest {
                encrypted_seed: Some(encrypted_seed),
            };
            match service.provision_seed(request) {
                Ok(response) => print_json(&response),
                Err(err) => report(err),
            }
        }
        "generate-code" => {
            if args.len() != 2 {
                return print_usage();
            }
            match service.generate_code(unix_now()) {
                Ok(response) => print_json(&response),
                Err(err) => report(err),
            }
        }
        "verify-code" => {
            if args.len() != 3 {
                return print_usage();
            }
            let request = VerifyRequest {
                code: Some(args[2].clone()),
            };
            match service.verify_code(request, unix_now()) {
                Ok(response) => print_json(&response),
                Err(err) => report(err),
            }
        }
        "issue-commit-proof" => {
            let commit_hash = match args.len() {
                2 => match head_commit() {
                    Ok(hash) => hash,
                    Err(err) => {
                        eprintln!("could not read HEAD commit: {err}");
                        return ExitCode::FAILURE;
                    }
                },
                3 => args[2].clone(),
                _ => return print_usage(),
            };
            match service.issue_commit_proof(&commit_hash) {
                Ok(proof) => {
                    println!("{proof}");
                    ExitCode::SUCCESS
                }
                Err(err) => report(err),
            }
        }
        "open-commit-proof" => {
            if args.len() != 6 {
                return print_usage();
            }
            let proof = match read_argument(&args[2]) {
                Ok(value) => value,
                Err(err) => {
                    eprintln!("input unreadable: {err}");
                    return ExitCode::FAILURE;
                }
            };
            let keys = load_private_key(Path::new(&args[4]))
                .and_then(|verifier| load_public_key(Path::new(&args[5])).map(|signer| (verifier, signer)));
            let (verifier, signer) = match keys {
                Ok(pair) => pair,
                Err(err) => {
                    eprintln!("{err}");
                    return ExitCode::FAILURE;
                }
            };
            match open_commit_proof(&proof, &args[3], &verifier, &signer) {
                Ok(valid) => print_json(&json!({ "valid": valid })),
                Err(err) => {
                    eprintln!("proof could not be opened: {err}");
                    ExitCode::FAILURE
                }
            }
        }
        "log-code" => {
            let now = Utc::now();
            match service.generate_code(now.timestamp()) {
                Ok(response) => {
                    println!("{} - 2FA Code: {}", now.format("%Y-%m-%d %H:%M:%S"), response.code);
                    ExitCode::SUCCESS
                }
                Err(ServiceError::SeedNotProvisioned) => {
                    eprintln!("Seed file not found");
                    ExitCode::SUCCESS
                }
                Err(err) => report(err),
            }
        }
        _ => print_usage(),
    }
}
