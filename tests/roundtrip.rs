//! Property tests for whole-document persistence.

use chirpy::{Chirp, ChirpId, Dataset, DocumentStore, StoreConfig, User, UserId};
use proptest::prelude::*;
use tempfile::TempDir;

fn dataset_strategy() -> impl Strategy<Value = Dataset> {
    let chirps = prop::collection::vec(".{0,140}", 0..20);
    let users = prop::collection::vec(("[a-z0-9.]{1,12}@[a-z]{1,8}\\.com", "\\PC{0,64}"), 0..10);

    (chirps, users).prop_map(|(bodies, users)| {
        let mut dataset = Dataset::default();
        for (i, body) in bodies.into_iter().enumerate() {
            let id = ChirpId(i as u64 + 1);
            dataset.chirps.insert(id, Chirp { id, body });
        }
        for (i, (email, password_hash)) in users.into_iter().enumerate() {
            let id = UserId(i as u64 + 1);
            dataset.users.insert(
                id,
                User {
                    id,
                    email,
                    password_hash,
                },
            );
        }
        dataset
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn replace_then_load_returns_same_dataset(dataset in dataset_strategy(), pretty in any::<bool>()) {
        let dir = TempDir::new().unwrap();
        let store = DocumentStore::open(StoreConfig {
            path: dir.path().join("database.json"),
            create_if_missing: true,
            pretty,
        })
        .unwrap();

        store.replace(&dataset).unwrap();
        prop_assert_eq!(store.load().unwrap(), dataset);
    }
}
