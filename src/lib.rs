//! # Chirpy
//!
//! Embedded persistence and credentials for a small message board.
//!
//! ## Core Concepts
//!
//! - **Dataset**: every user and chirp, persisted as one JSON document
//! - **Document store**: owns the file; loads and replaces it whole under a
//!   reader/writer lock, with an atomic read-modify-write primitive
//! - **Repositories**: typed chirp and user access with sequential ids and
//!   email uniqueness
//! - **Credentials**: PBKDF2 password hashes and HS256 session tokens
//!
//! ## Example
//!
//! ```ignore
//! use chirpy::{Chirpy, ChirpyConfig, StoreConfig};
//!
//! let chirpy = Chirpy::open(ChirpyConfig::new(
//!     StoreConfig { path: "./database.json".into(), ..Default::default() },
//!     "jwt-secret",
//! ))?;
//!
//! let chirp = chirpy.create_chirp("hello, world")?;
//! let user = chirpy.create_user("a@x.com", "pw1")?;
//! let session = chirpy.login("a@x.com", "pw1", 3600)?;
//! assert_eq!(chirpy.authenticate(&session.token)?, user);
//! ```

pub mod auth;
pub mod config;
pub mod content;
pub mod error;
pub mod metrics;
pub mod repos;
pub mod service;
pub mod store;
pub mod types;

// Re-exports
pub use auth::{login, AuthError, CredentialService, LoginResponse, TokenClaims};
pub use config::{ChirpyConfig, ConfigError};
pub use error::{Result, StoreError};
pub use metrics::HitCounter;
pub use repos::{ChirpRepository, UserRepository};
pub use service::Chirpy;
pub use store::{DocumentStore, StoreConfig};
pub use types::*;
