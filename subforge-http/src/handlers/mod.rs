use std::sync::Arc;

use subforge::process::ProcessSampler;
use subforge::{AppConfig, Backend};

pub mod health;
pub mod monitor;
pub mod users;

pub struct AppState {
    pub backend: Backend,
    pub config: AppConfig,
    pub sampler: ProcessSampler,
}

impl AppState {
    pub fn new(backend: Backend, config: AppConfig) -> Arc<Self> {
        Arc::new(Self {
            backend,
            config,
            sampler: ProcessSampler::new(),
        })
    }
}

pub use health::{health, route_not_found};
pub use monitor::{health_check, metrics, mongo_status};
pub use users::{create_user, delete_user, get_user, list_users, update_user};
