use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, crypto, decode_header,
    errors::{Error as JwtError, ErrorKind},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;

use crate::{config::AppConfig, error::CredentialDecodeFailure, models::Role};

/// ClaimShape
///
/// Where the role lives inside a decoded credential. The Quiz Master backend stores
/// its identity (`{id, role}`) under `sub`; older clients read a top-level `role`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClaimShape {
    /// `sub.role`
    Nested,
    /// `role`
    TopLevel,
    /// `sub.role`, falling back to `role`.
    #[default]
    Either,
}

impl FromStr for ClaimShape {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "nested" => Ok(ClaimShape::Nested),
            "top-level" | "toplevel" => Ok(ClaimShape::TopLevel),
            "either" => Ok(ClaimShape::Either),
            other => Err(other.to_string()),
        }
    }
}

/// Claims
///
/// The subset of the token payload the gate reads. Every field is optional so that
/// shape problems surface as `MissingRole` rather than as a parse error.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
}

/// DecodedClaim
///
/// Ephemeral result of decoding a credential. Recomputed on every navigation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecodedClaim {
    /// Raw role string as issued; see `known_role` for the typed view.
    pub role: String,
    pub user_id: Option<i64>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl DecodedClaim {
    pub fn known_role(&self) -> Option<Role> {
        Role::parse(&self.role)
    }
}

/// Seconds of clock skew tolerated on `exp` unless overridden.
pub const DEFAULT_LEEWAY_SECS: u64 = 60;

/// TokenDecoder
///
/// Turns a stored credential into a `DecodedClaim`.
///
/// With a secret, the HS256 signature is verified. Without one the payload is read
/// unverified, the same trust level as a browser-side token decode; `AppConfig`
/// only permits that outside production.
///
/// Only the signature goes through jsonwebtoken. The payload is parsed here because
/// the backend's `sub` is an object, which jsonwebtoken's claim validation rejects.
#[derive(Clone)]
pub struct TokenDecoder {
    key: Option<DecodingKey>,
    shape: ClaimShape,
    expiry_check: bool,
    leeway: u64,
}

impl TokenDecoder {
    pub fn new(secret: &str) -> Self {
        Self {
            key: Some(DecodingKey::from_secret(secret.as_bytes())),
            shape: ClaimShape::default(),
            expiry_check: true,
            leeway: DEFAULT_LEEWAY_SECS,
        }
    }

    pub fn unverified() -> Self {
        Self {
            key: None,
            shape: ClaimShape::default(),
            expiry_check: true,
            leeway: DEFAULT_LEEWAY_SECS,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        let decoder = match &config.jwt_secret {
            Some(secret) => Self::new(secret),
            None => Self::unverified(),
        };

        decoder
            .with_claim_shape(config.claim_shape)
            .with_expiry_check(config.validate_exp)
            .with_leeway(config.leeway_secs)
    }

    pub fn with_claim_shape(mut self, shape: ClaimShape) -> Self {
        self.shape = shape;
        self
    }

    /// Expired credentials count as undecodable when enabled. Disabling also stops
    /// requiring an `exp` claim.
    pub fn with_expiry_check(mut self, enabled: bool) -> Self {
        self.expiry_check = enabled;
        self
    }

    pub fn with_leeway(mut self, secs: u64) -> Self {
        self.leeway = secs;
        self
    }

    pub fn verifies_signature(&self) -> bool {
        self.key.is_some()
    }

    pub fn claim_shape(&self) -> ClaimShape {
        self.shape
    }

    pub fn decode(&self, token: &str) -> Result<DecodedClaim, CredentialDecodeFailure> {
        let claims = self.read_claims(token)?;

        let role = role_of(&claims, self.shape).ok_or(CredentialDecodeFailure::MissingRole)?;

        Ok(DecodedClaim {
            role,
            user_id: claims.sub.as_ref().and_then(user_id_of),
            expires_at: claims.exp.and_then(|exp| DateTime::<Utc>::from_timestamp(exp, 0)),
        })
    }

    fn read_claims(&self, token: &str) -> Result<Claims, JwtError> {
        let mut parts = token.split('.');
        let (Some(header), Some(payload), Some(signature), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(ErrorKind::InvalidToken.into());
        };

        // Parsing the header also rejects garbage in unverified mode.
        let alg = decode_header(token)?.alg;

        if let Some(key) = &self.key {
            if alg != Algorithm::HS256 {
                return Err(ErrorKind::InvalidAlgorithm.into());
            }
            let message = format!("{header}.{payload}");
            if !crypto::verify(signature, message.as_bytes(), key, Algorithm::HS256)? {
                return Err(ErrorKind::InvalidSignature.into());
            }
        }

        let raw = URL_SAFE_NO_PAD.decode(payload)?;
        let claims: Claims = serde_json::from_slice(&raw)?;

        if self.expiry_check {
            let exp = claims
                .exp
                .ok_or_else(|| ErrorKind::MissingRequiredClaim("exp".to_string()))?;
            let leeway = i64::try_from(self.leeway).unwrap_or(i64::MAX);
            if exp.saturating_add(leeway) < Utc::now().timestamp() {
                return Err(ErrorKind::ExpiredSignature.into());
            }
        }

        Ok(claims)
    }
}

fn role_of(claims: &Claims, shape: ClaimShape) -> Option<String> {
    let nested = || {
        claims
            .sub
            .as_ref()
            .and_then(|sub| sub.get("role"))
            .and_then(Value::as_str)
            .map(str::to_owned)
    };
    let top_level = || claims.role.clone();

    match shape {
        ClaimShape::Nested => nested(),
        ClaimShape::TopLevel => top_level(),
        ClaimShape::Either => nested().or_else(top_level),
    }
}

fn user_id_of(sub: &Value) -> Option<i64> {
    match sub {
        Value::Object(identity) => identity.get("id").and_then(user_id_of),
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}
