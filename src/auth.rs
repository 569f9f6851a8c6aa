use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use chrono::Utc;
use jsonwebtoken::{
    DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{config::AppConfig, error::ApiError, models::{Role, User}};

// Issued tokens live for one hour.
const TOKEN_TTL_SECS: i64 = 3600;

/// Claims
///
/// The payload signed into every bearer token. Beyond the registered `iat`
/// and `exp` claims it carries the full principal — id, username, email,
/// role — so that authenticated requests can be resolved without a
/// per-request user lookup.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (sub): the user's UUID.
    pub sub: Uuid,
    pub username: String,
    pub email: String,
    pub role: Role,
    /// Issued At (iat): timestamp when the token was created.
    pub iat: usize,
    /// Expiration Time (exp): timestamp after which the token is rejected.
    pub exp: usize,
}

/// AuthUser
///
/// The resolved identity of an authenticated request — the decoded principal
/// threaded explicitly into every policy and lifecycle call. Handlers receive
/// it through the extractor implementation below.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: Role,
}

/// issue_token
///
/// Signs a bearer token for `user` with a one-hour expiry, using the secret
/// from the application configuration.
pub fn issue_token(user: &User, config: &AppConfig) -> Result<String, ApiError> {
    let now = Utc::now().timestamp();
    let claims = Claims {
        sub: user.id,
        username: user.username.clone(),
        email: user.email.clone(),
        role: user.role,
        iat: now as usize,
        exp: (now + TOKEN_TTL_SECS) as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .map_err(|e| ApiError::internal("issue_token", e))
}

/// hash_password
///
/// Hashes a plaintext password with argon2id and a fresh random salt,
/// returning the PHC-format string that is stored as the credential hash.
/// The plaintext never leaves this boundary.
pub fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ApiError::internal("hash_password", e))
}

/// verify_password
///
/// Checks a plaintext password against a stored PHC-format hash. A malformed
/// stored hash is an internal failure, not a mismatch.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, ApiError> {
    let parsed = PasswordHash::new(hash).map_err(|e| ApiError::internal("verify_password", e))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// AuthUser Extractor Implementation
///
/// Implements Axum's FromRequestParts trait, making AuthUser usable as a
/// function argument in any authenticated handler. Extraction is the full
/// authentication step: Bearer token extraction, signature and expiry
/// validation, and claim decoding. The decoded claims are trusted as the
/// principal — there is no additional per-request database lookup.
///
/// Rejection: any failure yields the `AuthenticationRequired` (401) error,
/// rendered through the standard error envelope.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    // Allows the extractor to pull the AppConfig (for the token secret).
    AppConfig: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let config = AppConfig::from_ref(state);

        // 1. Token Extraction
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| {
                ApiError::AuthenticationRequired("Authentication required".to_string())
            })?;

        let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
            ApiError::AuthenticationRequired("Authentication required".to_string())
        })?;

        // 2. Decode and Validate
        let decoding_key = DecodingKey::from_secret(config.jwt_secret.as_bytes());
        let mut validation = Validation::default();
        validation.validate_exp = true;

        let token_data = match decode::<Claims>(token, &decoding_key, &validation) {
            Ok(data) => data,
            Err(e) => {
                let message = match e.kind() {
                    ErrorKind::ExpiredSignature => "Token expired",
                    _ => "Invalid token",
                };
                return Err(ApiError::AuthenticationRequired(message.to_string()));
            }
        };

        let claims = token_data.claims;

        Ok(AuthUser {
            id: claims.sub,
            username: claims.username,
            email: claims.email,
            role: claims.role,
        })
    }
}
