use std::sync::Arc;

use crate::error::{Result, SubforgeError};
use crate::store::UserStore;
use crate::types::{ListParams, NewUser, Pagination, User, UserPage, UserUpdate};
use crate::validation::{normalize_email, require_object_id};

/// User operations on top of a [`UserStore`]: id checks, duplicate-email
/// checks and pagination. Inputs are expected to be validated already.
#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn UserStore>,
}

impl UserService {
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self { store }
    }

    pub async fn list(&self, params: ListParams) -> Result<UserPage> {
        let (total, users) = tokio::try_join!(self.store.count(), self.store.list(&params))?;
        Ok(UserPage {
            users,
            pagination: Pagination::new(total, &params),
        })
    }

    pub async fn get(&self, id: &str) -> Result<User> {
        require_object_id(id)?;
        self.store
            .get(id)
            .await?
            .ok_or_else(|| SubforgeError::UserNotFound(id.to_string()))
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        self.store.find_by_email(&normalize_email(email)).await
    }

    pub async fn find_active(&self) -> Result<Vec<User>> {
        self.store.find_active().await
    }

    pub async fn create(&self, user: NewUser) -> Result<User> {
        if self.store.find_by_email(&user.email).await?.is_some() {
            return Err(SubforgeError::DuplicateEmail(user.email));
        }
        let created = self.store.insert(user).await?;
        tracing::info!(user_id = %created.id, "user created");
        Ok(created)
    }

    pub async fn update(&self, id: &str, update: UserUpdate) -> Result<User> {
        let current = self.get(id).await?;

        if let Some(email) = &update.email {
            if *email != current.email {
                if let Some(other) = self.store.find_by_email(email).await? {
                    if other.id != current.id {
                        return Err(SubforgeError::DuplicateEmail(email.clone()));
                    }
                }
            }
        }

        let updated = self
            .store
            .update(id, &update)
            .await?
            .ok_or_else(|| SubforgeError::UserNotFound(id.to_string()))?;
        tracing::info!(user_id = %updated.id, "user updated");
        Ok(updated)
    }

    pub async fn delete(&self, id: &str) -> Result<User> {
        require_object_id(id)?;
        let deleted = self
            .store
            .delete(id)
            .await?
            .ok_or_else(|| SubforgeError::UserNotFound(id.to_string()))?;
        tracing::info!(user_id = %deleted.id, "user deleted");
        Ok(deleted)
    }
}
