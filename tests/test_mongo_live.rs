//! Runs against a real server only when `SUBFORGE_TEST_MONGO_URI` is set,
//! e.g. `SUBFORGE_TEST_MONGO_URI=mongodb://127.0.0.1:27017`.

use std::sync::Arc;
use subforge::db::{close_gracefully, DatabaseMonitor, Link, MongoDatabase, Supervisor};
use subforge::store::{MongoUserStore, UserStore};
use subforge::validation::validate_new_user;
use subforge::{DbConfig, SubforgeError, UserService};

fn live_config() -> Option<DbConfig> {
    let uri = std::env::var("SUBFORGE_TEST_MONGO_URI").ok()?;
    Some(DbConfig {
        uri,
        database: format!("subforge_test_{}", std::process::id()),
        min_pool_size: 1,
        max_pool_size: 5,
        connect_timeout_ms: 5_000,
        socket_timeout_ms: 10_000,
        auto_index: true,
    })
}

#[tokio::test]
async fn test_live_user_round_trip() {
    let Some(config) = live_config() else {
        eprintln!("SUBFORGE_TEST_MONGO_URI not set, skipping");
        return;
    };

    let db = Arc::new(MongoDatabase::new(config));
    Supervisor::default()
        .connect_with_retry(db.as_ref())
        .await
        .unwrap();
    // second open reuses the client
    db.open().await.unwrap();

    let store = Arc::new(MongoUserStore::new(db.clone()));
    let users = UserService::new(store.clone());

    let jane = users
        .create(validate_new_user(Some("Jane Doe"), Some("jane@example.com")).unwrap())
        .await
        .unwrap();
    assert_eq!(users.get(&jane.id).await.unwrap().email, "jane@example.com");

    // the unique index catches a duplicate that bypasses the service check
    let err = store
        .insert(validate_new_user(Some("Jane Again"), Some("jane@example.com")).unwrap())
        .await
        .unwrap_err();
    assert!(matches!(err, SubforgeError::DuplicateEmail(_)));

    let status = db.status().await;
    assert!(status.is_connected);
    assert!(status.collections.contains(&"users".to_string()));
    assert!(db.health_check().await.is_healthy());

    users.delete(&jane.id).await.unwrap();
    db.database().await.unwrap().drop().await.unwrap();
    close_gracefully(db.as_ref()).await.unwrap();
    assert!(!db.status().await.is_connected);
}
