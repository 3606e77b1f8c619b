use async_trait::async_trait;
use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use super::monitor::{ConnectionStatus, DatabaseMonitor, HealthReport, HealthState};
use super::pool::{PoolSnapshot, PoolStats};
use super::state::{ConnectionState, ReadyState};
use super::supervisor::Link;
use crate::error::{Result, SubforgeError};

/// Stand-in database for in-memory storage. `set_reachable(false)` makes
/// every open and probe fail, which simulates an outage.
pub struct MemoryDatabase {
    state: ConnectionState,
    pool: PoolStats,
    reachable: AtomicBool,
}

impl Default for MemoryDatabase {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self {
            state: ConnectionState::new(),
            pool: PoolStats::new(0, 0),
            reachable: AtomicBool::new(true),
        }
    }

    pub fn set_reachable(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::SeqCst);
    }

    fn check_reachable(&self) -> Result<()> {
        if self.reachable.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(SubforgeError::Database("memory database unreachable".into()))
        }
    }
}

#[async_trait]
impl Link for MemoryDatabase {
    fn state(&self) -> &ConnectionState {
        &self.state
    }

    async fn open(&self) -> Result<()> {
        self.check_reachable()
    }

    async fn probe(&self) -> Result<()> {
        self.check_reachable()
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

#[async_trait]
impl DatabaseMonitor for MemoryDatabase {
    fn ready_state(&self) -> ReadyState {
        self.state.ready_state()
    }

    fn pool(&self) -> PoolSnapshot {
        self.pool.snapshot()
    }

    fn collection_count(&self) -> usize {
        usize::from(self.state.has_opened())
    }

    async fn status(&self) -> ConnectionStatus {
        let connected = self.state.is_connected();
        ConnectionStatus {
            is_connected: connected,
            host: Some("memory".to_string()),
            port: None,
            database: "memory".to_string(),
            ready_state: self.state.ready_state(),
            has_opened: self.state.has_opened(),
            models: vec!["User".to_string()],
            collections: if connected {
                vec!["users".to_string()]
            } else {
                Vec::new()
            },
            reconnect_attempts: self.state.attempt_count(),
            connected_at: self.state.connected_at(),
            last_error: self.state.last_error(),
            pool_info: self.pool.snapshot(),
            db_stats: None,
        }
    }

    async fn health_check(&self) -> HealthReport {
        let started = Instant::now();
        if let Err(e) = self.check_reachable() {
            return HealthReport::unhealthy(e.to_string(), started.elapsed().as_millis());
        }
        if !self.state.is_connected() {
            return HealthReport::unhealthy(
                SubforgeError::NotConnected.to_string(),
                started.elapsed().as_millis(),
            );
        }
        HealthReport {
            status: HealthState::Healthy,
            response_time: format!("{}ms", started.elapsed().as_millis()),
            version: Some(format!("subforge-memory/{}", env!("CARGO_PKG_VERSION"))),
            uptime: self
                .state
                .connected_at()
                .map(|t| (Utc::now() - t).num_milliseconds() as f64 / 1000.0),
            connections: None,
            operations: None,
            error: None,
            timestamp: Utc::now(),
        }
    }
}
