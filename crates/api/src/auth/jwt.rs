//! Portal session tokens.
//!
//! A token is an HS256 JWT naming the user id and the portal as issuer.
//! Role and permission flags are never embedded; the auth extractor re-reads
//! them from the database, so a revoked flag takes effect on the next call.

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use portal_core::types::DbId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::{env_or, env_required, ConfigError};

/// `iss` claim of every portal token.
pub const ISSUER: &str = "hotel-portal";

/// One work shift.
const DEFAULT_ACCESS_EXPIRY_MINS: i64 = 480;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// User id.
    pub sub: DbId,
    pub iss: String,
    pub exp: i64,
    pub iat: i64,
    /// Unique per token.
    pub jti: String,
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub access_token_expiry_mins: i64,
}

impl JwtConfig {
    /// | Env Var                  | Required | Default |
    /// |--------------------------|----------|---------|
    /// | `JWT_SECRET`             | **yes**  | none    |
    /// | `JWT_ACCESS_EXPIRY_MINS` | no       | `480`   |
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            secret: env_required("JWT_SECRET")?,
            access_token_expiry_mins: env_or("JWT_ACCESS_EXPIRY_MINS", DEFAULT_ACCESS_EXPIRY_MINS)?,
        })
    }

    fn validation() -> Validation {
        let mut validation = Validation::default();
        validation.set_issuer(&[ISSUER]);
        validation
    }
}

fn claims_for(user_id: DbId, config: &JwtConfig) -> Claims {
    let now = chrono::Utc::now().timestamp();
    Claims {
        sub: user_id,
        iss: ISSUER.to_string(),
        exp: now + config.access_token_expiry_mins * 60,
        iat: now,
        jti: Uuid::new_v4().to_string(),
    }
}

fn sign(claims: &Claims, config: &JwtConfig) -> Result<String, jsonwebtoken::errors::Error> {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
}

/// Issue a session token for `user_id`.
pub fn generate_access_token(
    user_id: DbId,
    config: &JwtConfig,
) -> Result<String, jsonwebtoken::errors::Error> {
    sign(&claims_for(user_id, config), config)
}

/// Check signature, expiry, and issuer.
pub fn validate_token(
    token: &str,
    config: &JwtConfig,
) -> Result<Claims, jsonwebtoken::errors::Error> {
    let key = DecodingKey::from_secret(config.secret.as_bytes());
    decode::<Claims>(token, &key, &JwtConfig::validation()).map(|data| data.claims)
}
