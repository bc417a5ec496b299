//! The in-process interface an HTTP layer drives.
//!
//! Errors pass through unchanged; mapping them to status codes is the
//! caller's job.

use crate::auth::{self, AuthError, CredentialService, LoginResponse};
use crate::config::ChirpyConfig;
use crate::content;
use crate::error::Result;
use crate::metrics::HitCounter;
use crate::repos::{ChirpRepository, UserRepository};
use crate::store::DocumentStore;
use crate::types::{Chirp, ChirpId, PublicUser, User};
use std::sync::Arc;
use std::time::Duration;

/// Store, repositories, credential service and hit counter, wired together.
pub struct Chirpy {
    store: Arc<DocumentStore>,
    chirps: ChirpRepository,
    users: UserRepository,
    credentials: CredentialService,
    hits: HitCounter,
}

impl Chirpy {
    pub fn open(config: ChirpyConfig) -> Result<Self> {
        let store = Arc::new(DocumentStore::open(config.store)?);
        let credentials = CredentialService::new(config.jwt_secret)
            .with_issuer(config.issuer)
            .with_password_iterations(config.password_iterations);

        Ok(Self {
            chirps: ChirpRepository::new(Arc::clone(&store)),
            users: UserRepository::new(Arc::clone(&store)),
            store,
            credentials,
            hits: HitCounter::new(),
        })
    }

    /// Reject over-long bodies, mask profanity, then persist.
    pub fn create_chirp(&self, body: &str) -> Result<Chirp> {
        let body = content::prepare_body(body)?;
        self.chirps.create(body)
    }

    pub fn list_chirps(&self) -> Result<Vec<Chirp>> {
        self.chirps.list()
    }

    pub fn get_chirp(&self, id: ChirpId) -> Result<Chirp> {
        self.chirps.get_by_id(id)
    }

    /// Hash the password and register the account.
    ///
    /// A taken email surfaces as `AuthError::Store(StoreError::EmailInUse)`.
    pub fn create_user(
        &self,
        email: &str,
        password: &str,
    ) -> std::result::Result<PublicUser, AuthError> {
        let hash = self.credentials.hash(password)?;
        let user = self.users.create(email, &hash)?;
        Ok(user.public())
    }

    /// The stored record, hash included.
    pub fn get_user_by_email(&self, email: &str) -> Result<User> {
        self.users.get_by_email(email)
    }

    pub fn login(
        &self,
        email: &str,
        password: &str,
        requested_ttl_seconds: u64,
    ) -> std::result::Result<LoginResponse, AuthError> {
        auth::login(
            &self.users,
            &self.credentials,
            email,
            password,
            Duration::from_secs(requested_ttl_seconds),
        )
    }

    /// Resolve a bearer token to the user it was issued for.
    pub fn authenticate(&self, token: &str) -> std::result::Result<PublicUser, AuthError> {
        let id = self.credentials.verify_token(token)?;
        match self.users.get_by_id(id) {
            Ok(user) => Ok(user.public()),
            Err(e) if e.is_not_found() => Err(AuthError::InvalidToken),
            Err(e) => Err(e.into()),
        }
    }

    pub fn credentials(&self) -> &CredentialService {
        &self.credentials
    }

    pub fn hits(&self) -> &HitCounter {
        &self.hits
    }

    pub fn store(&self) -> &DocumentStore {
        &self.store
    }
}
