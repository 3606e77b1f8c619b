use std::sync::Arc;

use crate::config::{AppConfig, DbConfig, StorageBackend};
use crate::db::{DatabaseMonitor, Link, MemoryDatabase, MongoDatabase};
use crate::store::{MemoryUserStore, MongoUserStore};
use crate::users::UserService;

/// One database handle seen through its three roles: lifecycle (`link`),
/// monitoring (`monitor`) and user storage (`users`).
#[derive(Clone)]
pub struct Backend {
    pub link: Arc<dyn Link>,
    pub monitor: Arc<dyn DatabaseMonitor>,
    pub users: UserService,
}

impl Backend {
    pub fn from_config(config: &AppConfig) -> Self {
        match config.storage {
            StorageBackend::Mongo => Self::mongo(config.db.clone()),
            StorageBackend::Memory => Self::memory(Arc::new(MemoryDatabase::new())),
        }
    }

    pub fn mongo(config: DbConfig) -> Self {
        let db = Arc::new(MongoDatabase::new(config));
        Self {
            link: db.clone(),
            monitor: db.clone(),
            users: UserService::new(Arc::new(MongoUserStore::new(db))),
        }
    }

    pub fn memory(db: Arc<MemoryDatabase>) -> Self {
        Self {
            link: db.clone(),
            monitor: db,
            users: UserService::new(Arc::new(MemoryUserStore::new())),
        }
    }
}
