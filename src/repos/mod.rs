//! Typed repositories over the document store.
//!
//! Both repositories allocate ids as `count + 1`. That equals the
//! high-water mark only because records are never deleted; adding deletion
//! would require switching to `max(id) + 1` or a persisted counter.

mod chirps;
mod users;

pub use chirps::ChirpRepository;
pub use users::UserRepository;
