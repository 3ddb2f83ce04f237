//! Runtime secret resolution.
//!
//! # Contract
//! - Config YAML stores only **env var NAMES** (e.g. `"PQP_VENUE_API_KEY"`).
//! - Callers resolve secrets once at startup via [`resolve_secrets_for_role`]
//!   and pass the result into constructors; never scatter `std::env::var`
//!   calls elsewhere.
//! - `Debug` redacts every value; error messages reference the env var NAME,
//!   never the value.

use anyhow::{bail, Result};
use serde_json::Value;

/// Which pipeline role is starting up — governs which secrets are required.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Generator,
    Validator,
    Backtester,
    Classifier,
    Deployer,
    Executor,
}

/// All runtime-resolved secrets for one process instantiation.
#[derive(Clone)]
pub struct ResolvedSecrets {
    pub database_url: String,
    /// Venue API key. Required for `Deployer`/`Executor`; optional elsewhere.
    pub venue_api_key: Option<String>,
    pub venue_api_secret: Option<String>,
    /// External LLM credential for the Generator's direct-synthesis sub-source.
    pub llm_api_key: Option<String>,
}

impl std::fmt::Debug for ResolvedSecrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedSecrets")
            .field("database_url", &"<REDACTED>")
            .field(
                "venue_api_key",
                &self.venue_api_key.as_ref().map(|_| "<REDACTED>"),
            )
            .field(
                "venue_api_secret",
                &self.venue_api_secret.as_ref().map(|_| "<REDACTED>"),
            )
            .field(
                "llm_api_key",
                &self.llm_api_key.as_ref().map(|_| "<REDACTED>"),
            )
            .finish()
    }
}

struct SecretEnvNames {
    database_url_var: String,
    venue_api_key_var: String,
    venue_api_secret_var: String,
    llm_api_key_var: String,
}

fn read_str_at(config: &Value, pointer: &str) -> Option<String> {
    let s = config.pointer(pointer)?.as_str()?;
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn resolve_env(var_name: &str) -> Option<String> {
    match std::env::var(var_name) {
        Ok(v) if !v.trim().is_empty() => Some(v),
        _ => None,
    }
}

fn parse_env_names(config_json: &Value) -> SecretEnvNames {
    SecretEnvNames {
        database_url_var: read_str_at(config_json, "/db/url_env")
            .unwrap_or_else(|| "PQP_DATABASE_URL".to_string()),
        venue_api_key_var: read_str_at(config_json, "/venue/keys_env/api_key")
            .unwrap_or_else(|| "PQP_VENUE_API_KEY".to_string()),
        venue_api_secret_var: read_str_at(config_json, "/venue/keys_env/api_secret")
            .unwrap_or_else(|| "PQP_VENUE_API_SECRET".to_string()),
        llm_api_key_var: read_str_at(config_json, "/generator/llm/api_key_env")
            .unwrap_or_else(|| "PQP_LLM_API_KEY".to_string()),
    }
}

/// Resolve secrets for the given `role`.
///
/// | Role                  | Required                          |
/// |------------------------|-----------------------------------|
/// | Deployer / Executor     | database url, venue key + secret  |
/// | Generator / Validator / Backtester / Classifier | database url only |
///
/// # Errors
/// Returns `Err` naming the first missing required env var; never its value.
pub fn resolve_secrets_for_role(config_json: &Value, role: Role) -> Result<ResolvedSecrets> {
    let names = parse_env_names(config_json);

    let database_url = resolve_env(&names.database_url_var).ok_or_else(|| {
        anyhow::anyhow!(
            "SECRETS_MISSING: required env var '{}' (database url) is not set or empty",
            names.database_url_var
        )
    })?;

    let venue_api_key = resolve_env(&names.venue_api_key_var);
    let venue_api_secret = resolve_env(&names.venue_api_secret_var);
    let llm_api_key = resolve_env(&names.llm_api_key_var);

    if matches!(role, Role::Deployer | Role::Executor) {
        if venue_api_key.is_none() {
            bail!(
                "SECRETS_MISSING role={:?}: required env var '{}' (venue api_key) is not set or empty",
                role,
                names.venue_api_key_var,
            );
        }
        if venue_api_secret.is_none() {
            bail!(
                "SECRETS_MISSING role={:?}: required env var '{}' (venue api_secret) is not set or empty",
                role,
                names.venue_api_secret_var,
            );
        }
    }

    Ok(ResolvedSecrets {
        database_url,
        venue_api_key,
        venue_api_secret,
        llm_api_key,
    })
}
