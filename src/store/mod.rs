pub mod memory;
pub mod mongo;

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{ListParams, NewUser, User, UserUpdate};

pub use memory::MemoryUserStore;
pub use mongo::MongoUserStore;

/// Persistence seam for users. Implementations enforce email uniqueness
/// and report violations as `DuplicateEmail`; ids are 24-hex ObjectIds.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn count(&self) -> Result<u64>;

    async fn list(&self, params: &ListParams) -> Result<Vec<User>>;

    async fn get(&self, id: &str) -> Result<Option<User>>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;

    async fn find_active(&self) -> Result<Vec<User>>;

    async fn insert(&self, user: NewUser) -> Result<User>;

    /// Apply the present fields and bump `updatedAt`. `None` if the id is unknown.
    async fn update(&self, id: &str, update: &UserUpdate) -> Result<Option<User>>;

    async fn delete(&self, id: &str) -> Result<Option<User>>;
}
