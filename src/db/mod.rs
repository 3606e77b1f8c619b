//! Database connection lifecycle: backoff policy, connection state, pool
//! counters, the supervisor that keeps a connection alive, and the MongoDB
//! and in-memory handles it drives.

pub mod backoff;
pub mod memory;
pub mod mongo;
pub mod monitor;
pub mod pool;
pub mod state;
pub mod supervisor;

pub use backoff::ReconnectPolicy;
pub use memory::MemoryDatabase;
pub use mongo::MongoDatabase;
pub use monitor::{ConnectionStatus, DatabaseMonitor, DbStats, HealthReport, HealthState};
pub use pool::{PoolSnapshot, PoolStats};
pub use state::{ConnectionState, ReadyState};
pub use supervisor::{close_gracefully, run_metrics_loop, shutdown_requested, Link, Supervisor};
