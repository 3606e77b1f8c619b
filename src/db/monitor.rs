use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use super::pool::PoolSnapshot;
use super::state::ReadyState;

/// Storage-level statistics (the subset of `dbStats` the dashboard shows).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DbStats {
    pub collections: i64,
    pub views: i64,
    pub objects: i64,
    pub avg_obj_size: f64,
    pub data_size: f64,
    pub storage_size: f64,
    pub indexes: i64,
    pub index_size: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionStatus {
    pub is_connected: bool,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub database: String,
    pub ready_state: ReadyState,
    pub has_opened: bool,
    pub models: Vec<String>,
    pub collections: Vec<String>,
    pub reconnect_attempts: u32,
    pub connected_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub pool_info: PoolSnapshot,
    pub db_stats: Option<DbStats>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthState {
    Healthy,
    Unhealthy,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub status: HealthState,
    /// Round-trip time formatted as `"<n>ms"`
    pub response_time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uptime: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connections: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operations: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl HealthReport {
    pub fn is_healthy(&self) -> bool {
        self.status == HealthState::Healthy
    }

    pub fn unhealthy(error: impl Into<String>, elapsed_ms: u128) -> Self {
        Self {
            status: HealthState::Unhealthy,
            response_time: format!("{}ms", elapsed_ms),
            version: None,
            uptime: None,
            connections: None,
            operations: None,
            error: Some(error.into()),
            timestamp: Utc::now(),
        }
    }
}

/// Read-only view of the database connection used by the monitoring API.
#[async_trait]
pub trait DatabaseMonitor: Send + Sync {
    fn ready_state(&self) -> ReadyState;

    fn pool(&self) -> PoolSnapshot;

    /// Number of collections known to the connection, without a round trip.
    fn collection_count(&self) -> usize;

    async fn status(&self) -> ConnectionStatus;

    async fn health_check(&self) -> HealthReport;
}
