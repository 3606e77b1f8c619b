use axum::{extract::State, http::StatusCode, response::Response};
use serde::Serialize;
use std::sync::Arc;

use super::AppState;
use crate::response::{respond, success};
use subforge::process::ProcessMetrics;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MongoConnectionMetrics {
    /// Numeric ready state (0-3)
    pub ready_state: u8,
    pub collections: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionPoolMetrics {
    pub total: u64,
    pub available: u64,
    pub waiting: u64,
    pub max_size: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemMetrics {
    pub process: ProcessMetrics,
    pub mongo_connection: MongoConnectionMetrics,
    pub connection_pool: ConnectionPoolMetrics,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

pub async fn mongo_status(State(state): State<Arc<AppState>>) -> Response {
    let status = state.backend.monitor.status().await;
    if status.is_connected {
        success(StatusCode::OK, "MongoDB status retrieved successfully", status)
    } else {
        respond(
            StatusCode::SERVICE_UNAVAILABLE,
            "MongoDB connection is not available",
            Some(status),
        )
    }
}

pub async fn metrics(State(state): State<Arc<AppState>>) -> Response {
    let monitor = &state.backend.monitor;
    let pool = monitor.pool();

    let metrics = SystemMetrics {
        process: state.sampler.sample(),
        mongo_connection: MongoConnectionMetrics {
            ready_state: monitor.ready_state().code(),
            collections: monitor.collection_count(),
        },
        connection_pool: ConnectionPoolMetrics {
            total: pool.total,
            available: pool.available,
            waiting: pool.waiting,
            max_size: pool.max_pool_size,
        },
        timestamp: chrono::Utc::now(),
    };
    success(StatusCode::OK, "System metrics retrieved successfully", metrics)
}

pub async fn health_check(State(state): State<Arc<AppState>>) -> Response {
    let report = state.backend.monitor.health_check().await;
    if report.is_healthy() {
        success(StatusCode::OK, "Health check successful", report)
    } else {
        tracing::warn!(error = ?report.error, "database health check failed");
        respond(
            StatusCode::SERVICE_UNAVAILABLE,
            "Health check failed",
            Some(report),
        )
    }
}
