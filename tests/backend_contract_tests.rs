/// Storage contract tests against live backends
///
/// Ignored by default. Run with a PostgreSQL and/or Redis instance:
///   TEST_DATABASE_URL=postgres://... TEST_REDIS_URL=redis://... \
///     cargo test --test backend_contract_tests -- --ignored
mod common;

use common::fixtures;
use std::sync::Arc;
use tokio::task::JoinSet;

use playlister_server::db::{DatabaseManager, DocumentDatabaseManager, PostgresDatabaseManager};
use playlister_server::error::StoreError;
use playlister_server::models::{
    Denial, NewPlaylist, NewUser, PlaylistId, PlaylistUpdate, User, UserId,
};

async fn postgres_manager() -> PostgresDatabaseManager {
    let url = std::env::var("TEST_DATABASE_URL").expect("TEST_DATABASE_URL must be set");
    let manager = PostgresDatabaseManager::with_url(&url, 2).expect("Failed to create pool");
    manager.connect().await.expect("Failed to connect");
    manager
}

async fn document_manager() -> DocumentDatabaseManager {
    let url = std::env::var("TEST_REDIS_URL").expect("TEST_REDIS_URL must be set");
    let namespace = format!("playlister-test-{}", uuid::Uuid::new_v4());
    let manager =
        DocumentDatabaseManager::with_namespace(&url, &namespace).expect("Failed to create client");
    manager.connect().await.expect("Failed to connect");
    manager
}

/// Unique email per run so reruns against the same database don't collide
fn unique_email(name: &str) -> String {
    format!("{}-{}@playlister.test", name, uuid::Uuid::new_v4().simple())
}

async fn create_test_user(db: &dyn DatabaseManager, first: &str) -> User {
    db.create_user(NewUser {
        first_name: first.to_string(),
        last_name: "Tester".to_string(),
        email: unique_email(first),
        password_hash: "hash".to_string(),
    })
    .await
    .expect("Failed to create test user")
}

async fn run_lifecycle(db: &dyn DatabaseManager) {
    let alice = create_test_user(db, "alice").await;

    let created = db
        .create_user_playlist(
            &alice.id,
            NewPlaylist {
                name: "Untitled 0".to_string(),
                songs: fixtures::two_songs(),
                owner_email: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(created.owner_email, alice.email);
    assert_eq!(created.songs, fixtures::two_songs());

    let read = db.get_playlist_by_id(&alice.id, &created.id).await.unwrap().unwrap();
    assert_eq!(read, created);

    let pairs = db.get_user_playlist_pairs(&alice.id).await.unwrap();
    assert_eq!(pairs.len(), 1);
    assert_eq!(pairs[0].id, created.id);
    assert_eq!(pairs[0].name, "Untitled 0");

    let replacement = vec![fixtures::song("Hey Ya", "OutKast", 2003, "PWgvGjAhvIw")];
    let updated = db
        .update_user_playlist(
            &alice.id,
            &created.id,
            PlaylistUpdate {
                name: "Renamed".to_string(),
                songs: replacement.clone(),
            },
        )
        .await
        .unwrap();
    assert!(updated.ok);

    let read = db.get_playlist_by_id(&alice.id, &created.id).await.unwrap().unwrap();
    assert_eq!(read.name, "Renamed");
    assert_eq!(read.songs, replacement);

    let all = db.get_all_playlists().await.unwrap();
    assert!(all.iter().any(|p| p.id == created.id));

    let deleted = db.delete_playlist(&alice.id, &created.id).await.unwrap();
    assert!(deleted.ok);
    assert!(db
        .get_playlist_by_id(&alice.id, &created.id)
        .await
        .unwrap()
        .is_none());
    assert!(db.get_user_playlist_pairs(&alice.id).await.unwrap().is_empty());

    let again = db.delete_playlist(&alice.id, &created.id).await.unwrap();
    assert_eq!(again.reason, Some(Denial::NotFound));
}

async fn run_ownership(db: &dyn DatabaseManager) {
    let alice = create_test_user(db, "alice").await;
    let bob = create_test_user(db, "bob").await;

    let created = db
        .create_user_playlist(
            &alice.id,
            NewPlaylist {
                name: "Alice only".to_string(),
                songs: fixtures::two_songs(),
                owner_email: Some(bob.email.clone()),
            },
        )
        .await
        .unwrap();
    assert_eq!(created.owner_email, alice.email);

    assert!(db.get_playlist_by_id(&bob.id, &created.id).await.unwrap().is_none());

    let update = db
        .update_user_playlist(
            &bob.id,
            &created.id,
            PlaylistUpdate {
                name: "Bob's now".to_string(),
                songs: Vec::new(),
            },
        )
        .await
        .unwrap();
    assert_eq!(update.reason, Some(Denial::Unauthorized));

    let delete = db.delete_playlist(&bob.id, &created.id).await.unwrap();
    assert_eq!(delete.reason, Some(Denial::Unauthorized));

    let intact = db.get_playlist_by_id(&alice.id, &created.id).await.unwrap().unwrap();
    assert_eq!(intact.name, "Alice only");
    assert_eq!(intact.songs.len(), 2);

    assert!(db.get_user_playlist_pairs(&bob.id).await.unwrap().is_empty());
}

async fn run_user_rules(db: &dyn DatabaseManager) {
    let alice = create_test_user(db, "alice").await;

    let by_email = db.get_user_by_email(&alice.email).await.unwrap().unwrap();
    assert_eq!(by_email.id, alice.id);
    let by_id = db.get_user_by_id(&alice.id).await.unwrap().unwrap();
    assert_eq!(by_id.email, alice.email);

    let duplicate = db
        .create_user(NewUser {
            first_name: "Other".to_string(),
            last_name: "Alice".to_string(),
            email: alice.email.clone(),
            password_hash: "hash".to_string(),
        })
        .await;
    assert!(matches!(duplicate, Err(StoreError::EmailTaken(_))));

    let ghost = UserId::new("999999999");
    let orphan = db
        .create_user_playlist(
            &ghost,
            NewPlaylist {
                name: "Nobody's".to_string(),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(orphan, Err(StoreError::OwnerNotFound(_))));

    let missing = PlaylistId::new("not-an-id");
    assert!(db.get_playlist_by_id(&alice.id, &missing).await.unwrap().is_none());
}

fn named(name: &str) -> NewPlaylist {
    NewPlaylist {
        name: name.to_string(),
        songs: fixtures::two_songs(),
        owner_email: None,
    }
}

async fn run_many_playlists(db: &dyn DatabaseManager) {
    let alice = create_test_user(db, "alice").await;
    let bob = create_test_user(db, "bob").await;

    let mut ids = Vec::new();
    for name in ["One", "Two", "Three"] {
        ids.push(db.create_user_playlist(&alice.id, named(name)).await.unwrap().id);
    }
    db.create_user_playlist(&bob.id, named("Bob's")).await.unwrap();

    assert_eq!(db.get_user_playlist_pairs(&alice.id).await.unwrap().len(), 3);

    assert!(db.delete_playlist(&alice.id, &ids[1]).await.unwrap().ok);

    let pairs = db.get_user_playlist_pairs(&alice.id).await.unwrap();
    assert_eq!(pairs.len(), 2);
    assert!(pairs.iter().all(|p| p.id != ids[1]));
    assert_eq!(db.get_user_playlist_pairs(&bob.id).await.unwrap().len(), 1);
}

/// Overlapping creates and deletes for one user must not lose membership
async fn run_concurrent_writes(db: Arc<dyn DatabaseManager>) {
    const COUNT: usize = 20;
    let alice = create_test_user(db.as_ref(), "alice").await;

    let mut creates = JoinSet::new();
    for i in 0..COUNT {
        let db = db.clone();
        let owner = alice.id.clone();
        creates.spawn(async move {
            db.create_user_playlist(&owner, named(&format!("Untitled {}", i)))
                .await
                .unwrap()
                .id
        });
    }

    let mut ids = Vec::new();
    while let Some(id) = creates.join_next().await {
        ids.push(id.unwrap());
    }
    assert_eq!(ids.len(), COUNT);
    assert_eq!(db.get_user_playlist_pairs(&alice.id).await.unwrap().len(), COUNT);

    let mut deletes = JoinSet::new();
    for id in ids.iter().take(COUNT / 2).cloned() {
        let db = db.clone();
        let owner = alice.id.clone();
        deletes.spawn(async move { db.delete_playlist(&owner, &id).await.unwrap() });
    }
    while let Some(result) = deletes.join_next().await {
        assert!(result.unwrap().ok);
    }

    assert_eq!(
        db.get_user_playlist_pairs(&alice.id).await.unwrap().len(),
        COUNT - COUNT / 2
    );
}

/// An update racing a delete either lands first or reports `NotFound`;
/// it never brings the playlist back
async fn run_update_delete_race(db: Arc<dyn DatabaseManager>) {
    let alice = create_test_user(db.as_ref(), "alice").await;

    for round in 0..50 {
        let id = db
            .create_user_playlist(&alice.id, named(&format!("Round {}", round)))
            .await
            .unwrap()
            .id;

        let delete = {
            let db = db.clone();
            let owner = alice.id.clone();
            let id = id.clone();
            tokio::spawn(async move { db.delete_playlist(&owner, &id).await.unwrap() })
        };
        let update = {
            let db = db.clone();
            let owner = alice.id.clone();
            let id = id.clone();
            tokio::spawn(async move {
                db.update_user_playlist(
                    &owner,
                    &id,
                    PlaylistUpdate {
                        name: "Raced".to_string(),
                        songs: Vec::new(),
                    },
                )
                .await
                .unwrap()
            })
        };

        let delete = delete.await.unwrap();
        let update = update.await.unwrap();

        assert!(delete.ok, "round {}: delete refused", round);
        assert!(update.ok || update.reason == Some(Denial::NotFound));
        assert!(
            db.get_playlist_by_id(&alice.id, &id).await.unwrap().is_none(),
            "round {}: playlist readable after delete",
            round
        );
    }

    assert!(db.get_user_playlist_pairs(&alice.id).await.unwrap().is_empty());
}

#[tokio::test]
#[ignore]
async fn test_postgres_lifecycle() {
    let db = postgres_manager().await;
    run_lifecycle(&db).await;
    db.disconnect().await.unwrap();
}

#[tokio::test]
#[ignore]
async fn test_postgres_ownership() {
    let db = postgres_manager().await;
    run_ownership(&db).await;
}

#[tokio::test]
#[ignore]
async fn test_postgres_user_rules() {
    let db = postgres_manager().await;
    run_user_rules(&db).await;
}

#[tokio::test]
#[ignore]
async fn test_postgres_many_playlists() {
    let db = postgres_manager().await;
    run_many_playlists(&db).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore]
async fn test_postgres_concurrent_writes() {
    let db: Arc<dyn DatabaseManager> = Arc::new(postgres_manager().await);
    run_concurrent_writes(db.clone()).await;
    run_update_delete_race(db).await;
}

#[tokio::test]
#[ignore]
async fn test_document_lifecycle() {
    let db = document_manager().await;
    run_lifecycle(&db).await;
    db.disconnect().await.unwrap();
}

#[tokio::test]
#[ignore]
async fn test_document_ownership() {
    let db = document_manager().await;
    run_ownership(&db).await;
}

#[tokio::test]
#[ignore]
async fn test_document_user_rules() {
    let db = document_manager().await;
    run_user_rules(&db).await;
}

#[tokio::test]
#[ignore]
async fn test_document_many_playlists() {
    let db = document_manager().await;
    run_many_playlists(&db).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore]
async fn test_document_concurrent_writes() {
    let db: Arc<dyn DatabaseManager> = Arc::new(document_manager().await);
    run_concurrent_writes(db.clone()).await;
    run_update_delete_race(db).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_memory_store_follows_contract() {
    let db = Arc::new(common::MemoryDatabaseManager::new());
    run_lifecycle(db.as_ref()).await;
    run_ownership(db.as_ref()).await;
    run_user_rules(db.as_ref()).await;
    run_many_playlists(db.as_ref()).await;
    run_concurrent_writes(db.clone()).await;
    run_update_delete_race(db).await;
}
