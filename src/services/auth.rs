//! Authentication service - session tokens and password hashing

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::UserId;

/// Cookie carrying the session token
pub const TOKEN_COOKIE: &str = "token";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid token: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("Password hashing failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),
}

#[derive(Debug, Clone)]
pub struct AuthService {
    secret: String,
    token_ttl: Duration,
    bcrypt_cost: u32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // Subject (user ID)
    pub exp: i64,    // Expiration time
    pub iat: i64,    // Issued at
}

impl AuthService {
    pub fn new(secret: impl Into<String>, token_ttl_hours: u64) -> Self {
        Self {
            secret: secret.into(),
            token_ttl: Duration::hours(token_ttl_hours as i64),
            bcrypt_cost: bcrypt::DEFAULT_COST,
        }
    }

    /// Lower the bcrypt work factor (tests only need it to be correct, not slow)
    pub fn with_bcrypt_cost(mut self, cost: u32) -> Self {
        self.bcrypt_cost = cost;
        self
    }

    pub fn token_ttl_secs(&self) -> i64 {
        self.token_ttl.num_seconds()
    }

    /// Hash a password using bcrypt
    pub fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        Ok(bcrypt::hash(password, self.bcrypt_cost)?)
    }

    /// Verify a password against a hash
    pub fn verify_password(&self, password: &str, hash: &str) -> Result<bool, AuthError> {
        Ok(bcrypt::verify(password, hash)?)
    }

    /// Issue a session token for a user
    pub fn create_token(&self, user_id: &UserId) -> Result<String, AuthError> {
        let now = Utc::now();
        let exp = now + self.token_ttl;

        let claims = Claims {
            sub: user_id.as_str().to_string(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
        };

        let encoding_key = EncodingKey::from_secret(self.secret.as_bytes());
        Ok(encode(&Header::default(), &claims, &encoding_key)?)
    }

    /// Verify a session token and return the user it was issued to
    pub fn verify_token(&self, token: &str) -> Result<UserId, AuthError> {
        let decoding_key = DecodingKey::from_secret(self.secret.as_bytes());
        let validation = Validation::default();

        let token_data = decode::<Claims>(token, &decoding_key, &validation)?;
        Ok(UserId::new(token_data.claims.sub))
    }
}
