//! Credential service: password hashing and bearer tokens.
//!
//! Sits above [`UserRepository`](crate::repos::UserRepository) and never
//! touches the dataset file itself.

mod password;
mod token;

pub use password::{hash_password, verify_password, DEFAULT_ITERATIONS};
pub use token::{clamp_ttl, TokenClaims, DEFAULT_TOKEN_TTL, MAX_TOKEN_TTL};

use crate::error::StoreError;
use crate::repos::UserRepository;
use crate::types::{Timestamp, UserId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Default token issuer.
pub const DEFAULT_ISSUER: &str = "chirpy";

/// Authentication errors.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Token missing")]
    MissingToken,

    #[error("Token invalid")]
    InvalidToken,

    #[error("Token expired")]
    TokenExpired,

    /// Unknown email or wrong password. Deliberately does not say which.
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Malformed password hash: {0}")]
    MalformedHash(String),

    #[error("Random generation failed: {0}")]
    RandomFailure(String),

    #[error("Token encoding failed: {0}")]
    Encoding(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl AuthError {
    /// Whether the caller should see an authentication failure rather than
    /// an internal error.
    pub fn is_unauthorized(&self) -> bool {
        matches!(
            self,
            AuthError::MissingToken
                | AuthError::InvalidToken
                | AuthError::TokenExpired
                | AuthError::InvalidCredentials
        )
    }
}

/// Hashes passwords and issues/verifies signed session tokens.
#[derive(Clone)]
pub struct CredentialService {
    secret: Vec<u8>,
    issuer: String,
    iterations: u32,
}

impl CredentialService {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: secret.into(),
            issuer: DEFAULT_ISSUER.to_string(),
            iterations: DEFAULT_ITERATIONS,
        }
    }

    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = issuer.into();
        self
    }

    /// Cost for newly created hashes. Existing hashes keep their own.
    pub fn with_password_iterations(mut self, iterations: u32) -> Self {
        self.iterations = iterations.max(1);
        self
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub fn hash(&self, password: &str) -> Result<String, AuthError> {
        hash_password(password, self.iterations)
    }

    pub fn verify(&self, password: &str, password_hash: &str) -> Result<bool, AuthError> {
        verify_password(password, password_hash)
    }

    /// Spend one verification at the configured cost, discarding the result.
    fn verify_decoy(&self, password: &str) {
        let _ = verify_password(password, &password::decoy_hash(self.iterations));
    }

    /// Issue a token for `user_id`, clamping `ttl` per [`clamp_ttl`].
    pub fn issue_token(&self, user_id: UserId, ttl: Duration) -> Result<String, AuthError> {
        self.issue_token_at(user_id, ttl, Timestamp::now())
    }

    pub fn issue_token_at(
        &self,
        user_id: UserId,
        ttl: Duration,
        issued_at: Timestamp,
    ) -> Result<String, AuthError> {
        let claims = TokenClaims {
            iss: self.issuer.clone(),
            sub: user_id.to_string(),
            iat: issued_at,
            exp: issued_at.saturating_add(clamp_ttl(ttl)),
        };
        token::sign(&self.secret, &claims)
    }

    /// Verify a token and return its subject.
    pub fn verify_token(&self, token: &str) -> Result<UserId, AuthError> {
        self.verify_token_at(token, Timestamp::now())?.user_id()
    }

    /// Verify a token as of `now` and return all of its claims.
    pub fn verify_token_at(&self, token: &str, now: Timestamp) -> Result<TokenClaims, AuthError> {
        token::verify(&self.secret, &self.issuer, token, now)
    }
}

impl fmt::Debug for CredentialService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialService")
            .field("secret", &"<redacted>")
            .field("issuer", &self.issuer)
            .field("iterations", &self.iterations)
            .finish()
    }
}

/// Successful login: the user without its hash, plus a session token.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    pub id: UserId,
    pub email: String,
    pub token: String,
}

/// Look up the user, check the password and issue a token.
///
/// An unknown email and a wrong password both yield
/// [`AuthError::InvalidCredentials`], and both pay for one password
/// verification.
pub fn login(
    users: &UserRepository,
    credentials: &CredentialService,
    email: &str,
    password: &str,
    requested_ttl: Duration,
) -> Result<LoginResponse, AuthError> {
    let user = match users.get_by_email(email) {
        Ok(user) => user,
        Err(e) if e.is_not_found() => {
            credentials.verify_decoy(password);
            warn!("Login rejected: unknown account");
            return Err(AuthError::InvalidCredentials);
        }
        Err(e) => return Err(e.into()),
    };

    if !credentials.verify(password, &user.password_hash)? {
        warn!(user_id = %user.id, "Login rejected: password mismatch");
        return Err(AuthError::InvalidCredentials);
    }

    let token = credentials.issue_token(user.id, requested_ttl)?;
    debug!(user_id = %user.id, "Login succeeded");

    Ok(LoginResponse {
        id: user.id,
        email: user.email,
        token,
    })
}
