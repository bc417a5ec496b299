//! Chirp repository.

use crate::error::{Result, StoreError};
use crate::store::DocumentStore;
use crate::types::{Chirp, ChirpId};
use std::sync::Arc;

/// Create and read chirps.
pub struct ChirpRepository {
    store: Arc<DocumentStore>,
}

impl ChirpRepository {
    pub fn new(store: Arc<DocumentStore>) -> Self {
        Self { store }
    }

    /// Persist a new chirp with the next id.
    ///
    /// The body is stored as given; length and content checks belong to the
    /// caller.
    pub fn create(&self, body: impl Into<String>) -> Result<Chirp> {
        let body = body.into();
        self.store.update(|dataset| {
            let id = ChirpId(dataset.chirps.len() as u64 + 1);
            if dataset.chirps.contains_key(&id) {
                return Err(StoreError::Corruption(format!(
                    "next chirp id {} already in use; ids are not contiguous",
                    id
                )));
            }
            let chirp = Chirp { id, body };
            dataset.chirps.insert(id, chirp.clone());
            Ok(chirp)
        })
    }

    /// All chirps, ascending by id.
    pub fn list(&self) -> Result<Vec<Chirp>> {
        self.store.read(|dataset| {
            let mut chirps: Vec<Chirp> = dataset.chirps.values().cloned().collect();
            chirps.sort_by_key(|c| c.id);
            Ok(chirps)
        })
    }

    pub fn get_by_id(&self, id: ChirpId) -> Result<Chirp> {
        self.store.read(|dataset| {
            dataset
                .chirps
                .get(&id)
                .cloned()
                .ok_or(StoreError::ChirpNotFound(id))
        })
    }

    pub fn count(&self) -> Result<usize> {
        self.store.read(|dataset| Ok(dataset.chirps.len()))
    }
}
