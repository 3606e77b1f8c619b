//! # Subforge
//!
//! User management and database connection lifecycle for the Subforge
//! subdomain hosting platform. The HTTP surface lives in the companion
//! `subforge-http` crate and the binary in `subforge-server`.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use subforge::db::{MemoryDatabase, Supervisor};
//! use subforge::validation::validate_new_user;
//! use subforge::Backend;
//!
//! # async fn run() -> subforge::Result<()> {
//! let backend = Backend::memory(Arc::new(MemoryDatabase::new()));
//! Supervisor::default()
//!     .connect_with_retry(backend.link.as_ref())
//!     .await?;
//!
//! let user = validate_new_user(Some("Jane Doe"), Some("jane@example.com"))?;
//! let created = backend.users.create(user).await?;
//! println!("created {}", created.id);
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature flags
//!
//! | Feature | Dependencies | Use case |
//! |---------|-------------|----------|
//! | `axum-support` | axum | [`SubforgeError`] implements `IntoResponse` |
//! | `process-stats` | sysinfo | memory and CPU figures in [`process::ProcessMetrics`] |

pub mod backend;
pub mod config;
pub mod db;
pub mod error;
pub mod process;
pub mod store;
pub mod types;
pub mod users;
pub mod validation;

pub use backend::Backend;
pub use config::{AppConfig, DbConfig, Environment, StorageBackend};
pub use error::{Result, SubforgeError};
pub use types::*;
pub use users::UserService;
