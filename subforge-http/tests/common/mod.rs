use std::sync::Arc;
use subforge::db::{MemoryDatabase, Supervisor};
use subforge::{AppConfig, Backend};
use subforge_http::build_router;
use subforge_http::handlers::AppState;
use tokio::net::TcpListener;

#[allow(dead_code)]
pub async fn spawn_server() -> (String, Arc<MemoryDatabase>) {
    spawn_server_with(AppConfig::in_memory(), true).await
}

/// Serve the full router over a memory backend. With `connect = false`
/// the database stays in the `disconnected` state.
pub async fn spawn_server_with(config: AppConfig, connect: bool) -> (String, Arc<MemoryDatabase>) {
    let db = Arc::new(MemoryDatabase::new());
    let backend = Backend::memory(Arc::clone(&db));
    if connect {
        Supervisor::default()
            .connect_with_retry(backend.link.as_ref())
            .await
            .unwrap();
    }

    let app = build_router(AppState::new(backend, config));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (addr, db)
}

#[allow(dead_code)]
pub async fn create_user(
    client: &reqwest::Client,
    addr: &str,
    name: &str,
    email: &str,
) -> serde_json::Value {
    let resp = client
        .post(format!("http://{}/api/users", addr))
        .json(&serde_json::json!({ "name": name, "email": email }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201, "create {} failed", email);
    let body: serde_json::Value = resp.json().await.unwrap();
    body["data"]["user"].clone()
}
