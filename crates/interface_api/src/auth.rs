//! Authentication and authorization
//!
//! Sessions are HS256 bearer tokens. The `sub` claim carries the user UUID
//! and `roles` the role names; both become an [`ActingUser`] that handlers
//! pass to the domain explicitly.

use std::str::FromStr;

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use core_kernel::UserId;
use domain_expenses::{ActingUser, Role};

/// JWT claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// User's roles
    pub roles: Vec<String>,
    /// Expiration timestamp
    pub exp: i64,
    /// Issued at timestamp
    pub iat: i64,
}

impl Claims {
    /// Converts the verified claims into the acting user
    ///
    /// Unknown role names are dropped; a non-UUID subject is rejected.
    pub fn acting_user(&self) -> Result<ActingUser, AuthError> {
        let id = Uuid::parse_str(&self.sub).map_err(|_| AuthError::InvalidSubject(self.sub.clone()))?;
        let mut user = ActingUser::new(UserId::from_uuid(id));
        for name in &self.roles {
            match Role::from_str(name) {
                Ok(role) => user = user.with_role(role),
                Err(e) => debug!(user_id = %self.sub, error = %e, "Ignoring role"),
            }
        }
        Ok(user)
    }
}

/// Auth errors
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid token")]
    InvalidToken,
    #[error("Token expired")]
    TokenExpired,
    #[error("Token subject is not a user id: {0}")]
    InvalidSubject(String),
    #[error("Missing role: {0}")]
    MissingRole(Role),
}

/// Creates a new JWT token
///
/// # Arguments
///
/// * `user_id` - User identifier
/// * `roles` - User's roles
/// * `secret` - JWT secret key
/// * `expiration_secs` - Token validity in seconds
pub fn create_token(
    user_id: UserId,
    roles: &[Role],
    secret: &str,
    expiration_secs: u64,
) -> Result<String, AuthError> {
    let now = Utc::now();
    let exp = now + Duration::seconds(expiration_secs as i64);

    let claims = Claims {
        sub: user_id.as_uuid().to_string(),
        roles: roles.iter().map(|r| r.as_str().to_string()).collect(),
        exp: exp.timestamp(),
        iat: now.timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|_| AuthError::InvalidToken)
}

/// Validates a JWT token
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, AuthError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        _ => AuthError::InvalidToken,
    })?;

    Ok(token_data.claims)
}

/// Fails unless the user holds `role`; admins hold every role
pub fn require_role(user: &ActingUser, role: Role) -> Result<(), AuthError> {
    if user.is_admin() || user.has_role(role) {
        Ok(())
    } else {
        Err(AuthError::MissingRole(role))
    }
}
