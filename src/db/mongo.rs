use async_trait::async_trait;
use mongodb::bson::{doc, Bson, Document};
use mongodb::event::cmap::CmapEvent;
use mongodb::event::EventHandler;
use mongodb::options::{ClientOptions, Compressor, ServerAddress, WriteConcern};
use mongodb::{Client, Database};
use std::sync::{Arc, RwLock as StdRwLock};
use std::time::Instant;
use tokio::sync::RwLock;

use super::monitor::{ConnectionStatus, DatabaseMonitor, DbStats, HealthReport, HealthState};
use super::pool::{PoolSnapshot, PoolStats};
use super::state::{ConnectionState, ReadyState};
use super::supervisor::Link;
use crate::config::DbConfig;
use crate::error::{Result, SubforgeError};

/// Models (and therefore collections) this service registers.
pub const MODELS: &[(&str, &str)] = &[("User", crate::store::mongo::USERS_COLLECTION)];

/// MongoDB connection handle with lifecycle state and pool counters.
pub struct MongoDatabase {
    config: DbConfig,
    client: RwLock<Option<Client>>,
    address: StdRwLock<Option<(String, Option<u16>)>>,
    state: ConnectionState,
    pool: Arc<PoolStats>,
}

impl MongoDatabase {
    pub fn new(config: DbConfig) -> Self {
        let pool = Arc::new(PoolStats::new(config.min_pool_size, config.max_pool_size));
        Self {
            config,
            client: RwLock::new(None),
            address: StdRwLock::new(None),
            state: ConnectionState::new(),
            pool,
        }
    }

    pub fn config(&self) -> &DbConfig {
        &self.config
    }

    /// The application database, or `NotConnected` before the first successful connect.
    pub async fn database(&self) -> Result<Database> {
        let client = self.client.read().await;
        client
            .as_ref()
            .map(|c| c.database(&self.config.database))
            .ok_or(SubforgeError::NotConnected)
    }

    async fn build_client(&self) -> Result<Client> {
        let mut options = ClientOptions::parse(&self.config.uri).await?;
        options.app_name = Some("subforge".to_string());
        options.min_pool_size = Some(self.config.min_pool_size);
        options.max_pool_size = Some(self.config.max_pool_size);
        options.server_selection_timeout = Some(self.config.connect_timeout());
        options.connect_timeout = Some(self.config.connect_timeout());
        options.compressors = Some(vec![Compressor::Zlib { level: None }]);
        options.retry_writes = Some(true);
        options.write_concern = Some(WriteConcern::majority());

        let pool = Arc::clone(&self.pool);
        options.cmap_event_handler = Some(EventHandler::callback(move |event: CmapEvent| {
            pool.handle_event(&event)
        }));

        if let Some(ServerAddress::Tcp { host, port }) = options.hosts.first() {
            if let Ok(mut addr) = self.address.write() {
                *addr = Some((host.clone(), *port));
            }
        }

        Ok(Client::with_options(options)?)
    }

    async fn ping(client: &Client) -> Result<()> {
        client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await?;
        Ok(())
    }

    async fn db_stats(&self) -> Option<DbStats> {
        let db = self.database().await.ok()?;
        let stats = db.run_command(doc! { "dbStats": 1 }).await.ok()?;
        Some(DbStats {
            collections: number(&stats, "collections") as i64,
            views: number(&stats, "views") as i64,
            objects: number(&stats, "objects") as i64,
            avg_obj_size: number(&stats, "avgObjSize"),
            data_size: number(&stats, "dataSize"),
            storage_size: number(&stats, "storageSize"),
            indexes: number(&stats, "indexes") as i64,
            index_size: number(&stats, "indexSize"),
        })
    }

    async fn collection_names(&self) -> Vec<String> {
        match self.database().await {
            Ok(db) => db.list_collection_names().await.unwrap_or_default(),
            Err(_) => Vec::new(),
        }
    }
}

/// Read a numeric field regardless of its BSON width.
fn number(doc: &Document, key: &str) -> f64 {
    match doc.get(key) {
        Some(Bson::Int32(n)) => *n as f64,
        Some(Bson::Int64(n)) => *n as f64,
        Some(Bson::Double(n)) => *n,
        _ => 0.0,
    }
}

fn sub_document_json(doc: &Document, key: &str) -> Option<serde_json::Value> {
    doc.get_document(key)
        .ok()
        .map(|d| Bson::Document(d.clone()).into_relaxed_extjson())
}

#[async_trait]
impl Link for MongoDatabase {
    fn state(&self) -> &ConnectionState {
        &self.state
    }

    async fn open(&self) -> Result<()> {
        let existing = self.client.read().await.clone();
        if existing.is_some() && self.state.is_connected() {
            tracing::info!("Using existing MongoDB connection");
            return Ok(());
        }

        // A client that lost its server is reused; the driver re-dials on demand.
        let client = match existing {
            Some(client) => client,
            None => self.build_client().await?,
        };
        Self::ping(&client).await?;

        if self.config.auto_index {
            let db = client.database(&self.config.database);
            crate::store::mongo::ensure_indexes(&db).await?;
        }

        *self.client.write().await = Some(client);

        let host = self
            .address
            .read()
            .ok()
            .and_then(|a| a.as_ref().map(|(h, _)| h.clone()))
            .unwrap_or_default();
        tracing::info!(host = %host, database = %self.config.database, "MongoDB Connected");
        Ok(())
    }

    async fn probe(&self) -> Result<()> {
        let client = self
            .client
            .read()
            .await
            .clone()
            .ok_or(SubforgeError::NotConnected)?;
        Self::ping(&client).await
    }

    async fn close(&self) -> Result<()> {
        let client = self.client.write().await.take();
        if let Some(client) = client {
            client.shutdown().await;
        }
        self.pool.reset();
        Ok(())
    }
}

#[async_trait]
impl DatabaseMonitor for MongoDatabase {
    fn ready_state(&self) -> ReadyState {
        self.state.ready_state()
    }

    fn pool(&self) -> PoolSnapshot {
        self.pool.snapshot()
    }

    fn collection_count(&self) -> usize {
        if self.state.has_opened() {
            MODELS.len()
        } else {
            0
        }
    }

    async fn status(&self) -> ConnectionStatus {
        let connected = self.state.is_connected();
        let (host, port) = self
            .address
            .read()
            .ok()
            .and_then(|a| a.clone())
            .map(|(h, p)| (Some(h), p))
            .unwrap_or((None, None));

        let (collections, db_stats) = if connected {
            (self.collection_names().await, self.db_stats().await)
        } else {
            (Vec::new(), None)
        };

        ConnectionStatus {
            is_connected: connected,
            host,
            port,
            database: self.config.database.clone(),
            ready_state: self.state.ready_state(),
            has_opened: self.state.has_opened(),
            models: MODELS.iter().map(|(m, _)| m.to_string()).collect(),
            collections,
            reconnect_attempts: self.state.attempt_count(),
            connected_at: self.state.connected_at(),
            last_error: self.state.last_error(),
            pool_info: self.pool.snapshot(),
            db_stats,
        }
    }

    async fn health_check(&self) -> HealthReport {
        let started = Instant::now();
        let client = match self.client.read().await.clone() {
            Some(c) => c,
            None => {
                return HealthReport::unhealthy(
                    SubforgeError::NotConnected.to_string(),
                    started.elapsed().as_millis(),
                )
            }
        };

        if let Err(e) = Self::ping(&client).await {
            return HealthReport::unhealthy(e.to_string(), started.elapsed().as_millis());
        }

        let server_status = match client
            .database("admin")
            .run_command(doc! { "serverStatus": 1 })
            .await
        {
            Ok(s) => s,
            Err(e) => return HealthReport::unhealthy(e.to_string(), started.elapsed().as_millis()),
        };

        HealthReport {
            status: HealthState::Healthy,
            response_time: format!("{}ms", started.elapsed().as_millis()),
            version: server_status.get_str("version").ok().map(str::to_string),
            uptime: Some(number(&server_status, "uptime")),
            connections: sub_document_json(&server_status, "connections"),
            operations: sub_document_json(&server_status, "opcounters"),
            error: None,
            timestamp: chrono::Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> DbConfig {
        DbConfig {
            uri: "mongodb://127.0.0.1:1".to_string(),
            database: "subforge_test".to_string(),
            min_pool_size: 1,
            max_pool_size: 5,
            connect_timeout_ms: 200,
            socket_timeout_ms: 200,
            auto_index: false,
        }
    }

    #[test]
    fn test_number_reads_any_width() {
        let d = doc! { "a": 3_i32, "b": 4_i64, "c": 2.5, "d": "x" };
        assert_eq!(number(&d, "a"), 3.0);
        assert_eq!(number(&d, "b"), 4.0);
        assert_eq!(number(&d, "c"), 2.5);
        assert_eq!(number(&d, "d"), 0.0);
        assert_eq!(number(&d, "missing"), 0.0);
    }

    #[tokio::test]
    async fn test_unopened_database_reports_disconnected() {
        let db = MongoDatabase::new(config());
        assert!(matches!(db.database().await, Err(SubforgeError::NotConnected)));
        assert!(matches!(db.probe().await, Err(SubforgeError::NotConnected)));

        let status = db.status().await;
        assert!(!status.is_connected);
        assert_eq!(status.ready_state, ReadyState::Disconnected);
        assert_eq!(status.models, vec!["User".to_string()]);
        assert!(status.db_stats.is_none());
        assert_eq!(db.collection_count(), 0);

        let health = db.health_check().await;
        assert!(!health.is_healthy());
        assert_eq!(health.error.as_deref(), Some("Database not connected"));
    }

    #[tokio::test]
    async fn test_open_reuses_connected_client() {
        let db = MongoDatabase::new(config());
        let client = db.build_client().await.unwrap();
        *db.client.write().await = Some(client);
        db.state.mark_connected();

        // nothing listens on the configured port, so any dial would fail
        db.open().await.unwrap();
        assert!(db.state.is_connected());
        assert!(db.database().await.is_ok());

        // once the link is marked down the same client must be pinged again
        db.state.mark_failed("connection reset");
        assert!(db.open().await.is_err());
    }

    #[tokio::test]
    async fn test_open_fails_fast_against_closed_port() {
        let db = MongoDatabase::new(config());
        assert!(db.open().await.is_err());
        assert!(db.database().await.is_err());
    }
}
