//! Top-level configuration.

use crate::auth::{DEFAULT_ISSUER, DEFAULT_ITERATIONS};
use crate::store::StoreConfig;
use std::path::PathBuf;
use thiserror::Error;

/// Environment variable naming the dataset file.
pub const ENV_DB_PATH: &str = "DB_PATH";

/// Environment variable holding the token signing secret.
pub const ENV_JWT_SECRET: &str = "JWT_SECRET";

/// Optional override of the token issuer.
pub const ENV_JWT_ISSUER: &str = "JWT_ISSUER";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required variable: {0}")]
    MissingVar(&'static str),
}

/// Everything needed to open a [`Chirpy`](crate::service::Chirpy).
#[derive(Clone)]
pub struct ChirpyConfig {
    pub store: StoreConfig,
    pub jwt_secret: String,
    pub issuer: String,
    /// PBKDF2 cost for new password hashes.
    pub password_iterations: u32,
}

impl ChirpyConfig {
    pub fn new(store: StoreConfig, jwt_secret: impl Into<String>) -> Self {
        Self {
            store,
            jwt_secret: jwt_secret.into(),
            issuer: DEFAULT_ISSUER.to_string(),
            password_iterations: DEFAULT_ITERATIONS,
        }
    }

    /// Read `DB_PATH`, `JWT_SECRET` and `JWT_ISSUER` from the process
    /// environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        let jwt_secret = get(ENV_JWT_SECRET).ok_or(ConfigError::MissingVar(ENV_JWT_SECRET))?;

        let mut store = StoreConfig::default();
        if let Some(path) = get(ENV_DB_PATH) {
            store.path = PathBuf::from(path);
        }

        let mut config = Self::new(store, jwt_secret);
        if let Some(issuer) = get(ENV_JWT_ISSUER) {
            config.issuer = issuer;
        }
        Ok(config)
    }
}

impl std::fmt::Debug for ChirpyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChirpyConfig")
            .field("store", &self.store)
            .field("jwt_secret", &"<redacted>")
            .field("issuer", &self.issuer)
            .field("password_iterations", &self.password_iterations)
            .finish()
    }
}
