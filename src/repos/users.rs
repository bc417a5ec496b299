//! User repository.

use crate::error::{Result, StoreError};
use crate::store::DocumentStore;
use crate::types::{User, UserId};
use std::sync::Arc;

/// Create and look up users. Emails are unique (exact, case-sensitive).
pub struct UserRepository {
    store: Arc<DocumentStore>,
}

impl UserRepository {
    pub fn new(store: Arc<DocumentStore>) -> Self {
        Self { store }
    }

    /// Persist a new user unless the email is already taken.
    ///
    /// The uniqueness check and the insert happen under one exclusive lock.
    /// The returned record includes the hash; scrub it with
    /// [`User::public`] before it leaves the process.
    pub fn create(&self, email: &str, password_hash: &str) -> Result<User> {
        self.store.update(|dataset| {
            if dataset.users.values().any(|u| u.email == email) {
                return Err(StoreError::EmailInUse(email.to_string()));
            }

            let id = UserId(dataset.users.len() as u64 + 1);
            if dataset.users.contains_key(&id) {
                return Err(StoreError::Corruption(format!(
                    "next user id {} already in use; ids are not contiguous",
                    id
                )));
            }
            let user = User {
                id,
                email: email.to_string(),
                password_hash: password_hash.to_string(),
            };
            dataset.users.insert(id, user.clone());
            Ok(user)
        })
    }

    pub fn get_by_email(&self, email: &str) -> Result<User> {
        self.store.read(|dataset| {
            dataset
                .users
                .values()
                .find(|u| u.email == email)
                .cloned()
                .ok_or_else(|| StoreError::UserNotFound(email.to_string()))
        })
    }

    pub fn get_by_id(&self, id: UserId) -> Result<User> {
        self.store.read(|dataset| {
            dataset
                .users
                .get(&id)
                .cloned()
                .ok_or_else(|| StoreError::UserNotFound(id.to_string()))
        })
    }

    /// Users cannot be modified once created. Nothing is written.
    pub fn update(&self, _id: UserId, _email: &str, _password_hash: &str) -> Result<User> {
        Err(StoreError::Unsupported("user update"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoreConfig;
    use tempfile::TempDir;

    fn test_repo(dir: &TempDir) -> UserRepository {
        let store = DocumentStore::open(StoreConfig {
            path: dir.path().join("database.json"),
            ..Default::default()
        })
        .unwrap();
        UserRepository::new(Arc::new(store))
    }

    #[test]
    fn test_create_and_lookup() {
        let dir = TempDir::new().unwrap();
        let repo = test_repo(&dir);

        let a = repo.create("a@x.com", "hash-a").unwrap();
        let b = repo.create("b@x.com", "hash-b").unwrap();
        assert_eq!(a.id, UserId(1));
        assert_eq!(b.id, UserId(2));

        assert_eq!(repo.get_by_email("b@x.com").unwrap(), b);
        assert_eq!(repo.get_by_id(UserId(1)).unwrap(), a);
    }

    #[test]
    fn test_duplicate_email() {
        let dir = TempDir::new().unwrap();
        let repo = test_repo(&dir);

        repo.create("a@x.com", "h1").unwrap();
        let result = repo.create("a@x.com", "h2");
        assert!(matches!(result, Err(StoreError::EmailInUse(_))));

        // The original record is untouched and no id was consumed.
        assert_eq!(repo.get_by_email("a@x.com").unwrap().password_hash, "h1");
        assert_eq!(repo.create("c@x.com", "h3").unwrap().id, UserId(2));
    }

    #[test]
    fn test_email_match_is_case_sensitive() {
        let dir = TempDir::new().unwrap();
        let repo = test_repo(&dir);

        repo.create("a@x.com", "h").unwrap();
        repo.create("A@x.com", "h").unwrap();
        assert!(matches!(
            repo.get_by_email("A@X.COM"),
            Err(StoreError::UserNotFound(_))
        ));
    }

    #[test]
    fn test_lookup_on_empty_store() {
        let dir = TempDir::new().unwrap();
        let repo = test_repo(&dir);

        assert!(repo.get_by_email("nobody@x.com").unwrap_err().is_not_found());
        assert!(repo.get_by_id(UserId(1)).unwrap_err().is_not_found());
    }

    #[test]
    fn test_create_refuses_to_overwrite_on_id_gap() {
        let dir = TempDir::new().unwrap();
        let repo = test_repo(&dir);

        let mut dataset = crate::types::Dataset::default();
        for (id, email) in [(1, "a@x.com"), (3, "keep@x.com")] {
            let id = UserId(id);
            dataset.users.insert(
                id,
                User {
                    id,
                    email: email.to_string(),
                    password_hash: "h".to_string(),
                },
            );
        }
        repo.store.replace(&dataset).unwrap();

        let result = repo.create("new@x.com", "h");
        assert!(matches!(result, Err(StoreError::Corruption(_))));
        assert_eq!(repo.get_by_id(UserId(3)).unwrap().email, "keep@x.com");
        assert!(repo.get_by_email("new@x.com").unwrap_err().is_not_found());
    }

    #[test]
    fn test_update_is_unsupported() {
        let dir = TempDir::new().unwrap();
        let repo = test_repo(&dir);

        let user = repo.create("a@x.com", "h").unwrap();
        let result = repo.update(user.id, "b@x.com", "h2");
        assert!(matches!(result, Err(StoreError::Unsupported(_))));
        assert_eq!(repo.get_by_id(user.id).unwrap(), user);
    }
}
