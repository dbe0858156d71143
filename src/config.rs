use std::{env, path::PathBuf};

use crate::{auth::ClaimShape, error::ConfigError};

/// AppConfig
///
/// Holds the gate's entire configuration. Immutable once loaded and kept on
/// `AppState` next to the table and decoder built from it.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Runtime environment marker. Controls whether unverified decoding is allowed.
    pub env: Env,
    // HMAC secret used to verify credentials. None means unverified decoding.
    pub jwt_secret: Option<String>,
    // Where the role claim is read from.
    pub claim_shape: ClaimShape,
    // Whether expired credentials are treated as undecodable.
    pub validate_exp: bool,
    // Clock leeway, in seconds, applied to the expiry check.
    pub leeway_secs: u64,
    // Optional JSON route table replacing the built-in one.
    pub routes_file: Option<PathBuf>,
    pub bind_addr: String,
}

/// Env
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

impl Default for AppConfig {
    /// Local, unverified defaults used for test setup.
    fn default() -> Self {
        Self {
            env: Env::Local,
            jwt_secret: None,
            claim_shape: ClaimShape::Either,
            validate_exp: true,
            leeway_secs: 0,
            routes_file: None,
            bind_addr: "0.0.0.0:3000".to_string(),
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads the configuration from environment variables. Production requires
    /// `JWT_SECRET_KEY`; locally an absent secret means credentials are decoded
    /// without signature verification.
    pub fn load() -> Result<Self, ConfigError> {
        let env = match env::var("APP_ENV").as_deref() {
            Ok("production") => Env::Production,
            _ => Env::Local,
        };

        let jwt_secret = env::var("JWT_SECRET_KEY").ok().filter(|s| !s.is_empty());
        if env == Env::Production && jwt_secret.is_none() {
            return Err(ConfigError::MissingSecret);
        }

        let defaults = Self::default();

        let claim_shape = match env::var("GATE_CLAIM_SHAPE") {
            Ok(raw) => raw.parse::<ClaimShape>().map_err(|value| ConfigError::Invalid {
                var: "GATE_CLAIM_SHAPE",
                value,
            })?,
            Err(_) => defaults.claim_shape,
        };

        let validate_exp = match env::var("GATE_VALIDATE_EXP") {
            Ok(raw) => parse_flag(&raw).ok_or(ConfigError::Invalid {
                var: "GATE_VALIDATE_EXP",
                value: raw,
            })?,
            Err(_) => defaults.validate_exp,
        };

        let leeway_secs = match env::var("GATE_LEEWAY_SECS") {
            Ok(raw) => raw.trim().parse::<u64>().map_err(|_| ConfigError::Invalid {
                var: "GATE_LEEWAY_SECS",
                value: raw,
            })?,
            Err(_) => defaults.leeway_secs,
        };

        Ok(Self {
            env,
            jwt_secret,
            claim_shape,
            validate_exp,
            leeway_secs,
            routes_file: env::var("GATE_ROUTES_FILE").ok().map(PathBuf::from),
            bind_addr: env::var("GATE_BIND_ADDR").unwrap_or(defaults.bind_addr),
        })
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
