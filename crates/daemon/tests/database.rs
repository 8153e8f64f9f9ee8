//! SQLite-backed account and catalog providers.

use tempfile::TempDir;

use bytes::Bytes;

use common::account::{
    AccountError, AccountProvider, CredentialStore, HashParams, PasswordHasher,
};
use common::blobs_store::BlobStore;
use common::catalog::{CatalogError, CatalogProvider, FileDescriptor};
use common::files::{FileError, FileService};
use common::validation::{Filename, Username};
use stash_daemon::Database;

/// Create a test database on disk
async fn setup_test_db() -> (Database, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test.db");

    let db_url = format!("sqlite://{}", db_path.display());
    let db = Database::connect(&url::Url::parse(&db_url).unwrap())
        .await
        .unwrap();

    (db, temp_dir)
}

fn user(name: &str) -> Username {
    Username::parse(name).unwrap()
}

fn descriptor(owner: &str, filename: &str, len: u64) -> FileDescriptor {
    FileDescriptor::new(
        user(owner),
        Filename::parse(filename).unwrap(),
        "text/plain",
        len,
    )
}

#[tokio::test]
async fn test_accounts_insert_and_lookup() {
    let (db, _dir) = setup_test_db().await;
    let alice = user("alice");

    assert!(!db.account_exists(&alice).await.unwrap());
    assert!(db.password_hash(&alice).await.unwrap().is_none());

    db.insert_account(&alice, "$argon2id$fake").await.unwrap();

    assert!(db.account_exists(&alice).await.unwrap());
    assert_eq!(
        db.password_hash(&alice).await.unwrap().as_deref(),
        Some("$argon2id$fake")
    );
}

#[tokio::test]
async fn test_duplicate_account_is_conflict() {
    let (db, _dir) = setup_test_db().await;
    let alice = user("alice");

    db.insert_account(&alice, "hash1").await.unwrap();
    let err = db.insert_account(&alice, "hash2").await.unwrap_err();
    assert!(matches!(err, AccountError::Conflict(u) if u == alice));

    // the first hash is untouched
    assert_eq!(
        db.password_hash(&alice).await.unwrap().as_deref(),
        Some("hash1")
    );
}

#[tokio::test]
async fn test_catalog_roundtrip() {
    let (db, _dir) = setup_test_db().await;
    let row = descriptor("alice", "notes.txt", 42);

    db.insert(&row).await.unwrap();

    let stored = db
        .get(&row.owner, &row.filename)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.owner, row.owner);
    assert_eq!(stored.filename, row.filename);
    assert_eq!(stored.content_type, "text/plain");
    assert_eq!(stored.content_length, 42);
    assert_eq!(stored.created_at.unix_timestamp(), row.created_at.unix_timestamp());

    assert!(db.exists(&row.owner, &row.filename).await.unwrap());
    assert!(!db
        .exists(&user("bob"), &row.filename)
        .await
        .unwrap());
}

#[tokio::test]
async fn test_catalog_conflict_and_delete() {
    let (db, _dir) = setup_test_db().await;
    let row = descriptor("alice", "a.txt", 1);

    db.insert(&row).await.unwrap();
    let err = db.insert(&descriptor("alice", "a.txt", 2)).await.unwrap_err();
    assert!(matches!(err, CatalogError::Conflict(_, _)));

    // same name for another owner is fine
    db.insert(&descriptor("bob", "a.txt", 3)).await.unwrap();

    db.delete(&row.owner, &row.filename).await.unwrap();
    let err = db.delete(&row.owner, &row.filename).await.unwrap_err();
    assert!(matches!(err, CatalogError::NotFound(_, _)));
    assert!(db.get(&row.owner, &row.filename).await.unwrap().is_none());
}

#[tokio::test]
async fn test_listing_keeps_insertion_order() {
    let (db, _dir) = setup_test_db().await;

    for name in ["zeta", "alpha", "mid"] {
        db.insert(&descriptor("alice", name, 1)).await.unwrap();
    }
    db.insert(&descriptor("bob", "other", 1)).await.unwrap();

    assert_eq!(
        db.list_by_owner(&user("alice")).await.unwrap(),
        vec!["zeta", "alpha", "mid"]
    );
    assert!(db.list_by_owner(&user("carol")).await.unwrap().is_empty());

    let all = db.list_all().await.unwrap();
    assert_eq!(all.len(), 4);
    assert_eq!(all[3].owner.as_str(), "bob");
}

#[tokio::test]
async fn test_data_survives_reconnect() {
    let temp_dir = TempDir::new().unwrap();
    let url = url::Url::parse(&format!(
        "sqlite://{}",
        temp_dir.path().join("persist.db").display()
    ))
    .unwrap();

    {
        let db = Database::connect(&url).await.unwrap();
        db.insert_account(&user("alice"), "hash").await.unwrap();
        db.insert(&descriptor("alice", "kept.txt", 4)).await.unwrap();
        db.close().await;
    }

    let db = Database::connect(&url).await.unwrap();
    assert!(db.account_exists(&user("alice")).await.unwrap());
    assert_eq!(
        db.list_by_owner(&user("alice")).await.unwrap(),
        vec!["kept.txt"]
    );
}

const RACERS: usize = 8;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_parallel_puts_of_one_key_have_one_winner() {
    let (db, dir) = setup_test_db().await;
    let blobs = BlobStore::new_local(&dir.path().join("blobs")).await.unwrap();
    let service = FileService::new(db, blobs);

    for round in 0..10 {
        let filename = format!("race{round}.bin");
        let handles: Vec<_> = (0..RACERS)
            .map(|i| {
                let service = service.clone();
                let filename = filename.clone();
                tokio::spawn(async move {
                    let body = futures::stream::iter(vec![Ok::<_, std::io::Error>(
                        Bytes::from(vec![i as u8; 4]),
                    )]);
                    service
                        .put(&user("alice"), &filename, "application/octet-stream", 4, body)
                        .await
                })
            })
            .collect();

        let mut won = 0;
        let mut conflicts = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => won += 1,
                Err(FileError::Conflict(_, _)) => conflicts += 1,
                Err(e) => panic!("unexpected error: {e}"),
            }
        }
        assert_eq!(won, 1, "{filename}");
        assert_eq!(conflicts, RACERS - 1, "{filename}");

        let file = service.get(&user("alice"), &filename).await.unwrap();
        assert_eq!(file.reader.bytes().await.unwrap().len(), 4);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_parallel_registrations_of_one_name_have_one_winner() {
    let (db, _dir) = setup_test_db().await;
    let hasher = PasswordHasher::new(HashParams {
        memory_kib: 1024,
        iterations: 1,
        parallelism: 1,
    })
    .unwrap();
    let store = CredentialStore::new(db, hasher);

    let handles: Vec<_> = (0..RACERS)
        .map(|i| {
            let store = store.clone();
            tokio::spawn(async move { store.register("alice", &format!("password{i}")).await })
        })
        .collect();

    let mut won = 0;
    let mut conflicts = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => won += 1,
            Err(AccountError::Conflict(_)) => conflicts += 1,
            Err(e) => panic!("unexpected error: {e}"),
        }
    }
    assert_eq!(won, 1);
    assert_eq!(conflicts, RACERS - 1);
}
