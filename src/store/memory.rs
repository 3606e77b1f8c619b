use async_trait::async_trait;
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use mongodb::bson::oid::ObjectId;

use super::UserStore;
use crate::error::{Result, SubforgeError};
use crate::types::{ListParams, NewUser, SortField, User, UserUpdate};

/// In-process [`UserStore`]. Ids are real ObjectIds so they sort in
/// creation order and pass the same validation as stored ones.
#[derive(Default)]
pub struct MemoryUserStore {
    users: DashMap<String, User>,
    /// email -> id
    emails: DashMap<String, String>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn sorted(&self, sort: Option<SortField>) -> Vec<User> {
        let mut users: Vec<User> = self.users.iter().map(|u| u.value().clone()).collect();
        users.sort_by(|a, b| {
            let primary = match sort {
                Some(SortField::Name) => a.name.cmp(&b.name),
                Some(SortField::Email) => a.email.cmp(&b.email),
                Some(SortField::CreatedAt) => a.created_at.cmp(&b.created_at),
                Some(SortField::UpdatedAt) => a.updated_at.cmp(&b.updated_at),
                None => std::cmp::Ordering::Equal,
            };
            primary.then_with(|| a.id.cmp(&b.id))
        });
        users
    }

    fn reserve_email(&self, id: &str, email: &str) -> Result<()> {
        match self.emails.entry(email.to_string()) {
            Entry::Occupied(_) => Err(SubforgeError::DuplicateEmail(email.to_string())),
            Entry::Vacant(slot) => {
                slot.insert(id.to_string());
                Ok(())
            }
        }
    }

    /// Writes the update into the stored record. If the user was deleted
    /// after its new email was reserved, the reservation is released.
    fn apply_update(&self, id: &str, update: &UserUpdate) -> Option<User> {
        let mut user = match self.users.get_mut(id) {
            Some(u) => u,
            None => {
                if let Some(email) = &update.email {
                    self.emails.remove_if(email, |_, owner| owner == id);
                }
                return None;
            }
        };
        if let Some(name) = &update.name {
            user.name = name.clone();
        }
        if let Some(email) = &update.email {
            user.email = email.clone();
        }
        user.updated_at = Utc::now();
        Some(user.clone())
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn count(&self) -> Result<u64> {
        Ok(self.users.len() as u64)
    }

    async fn list(&self, params: &ListParams) -> Result<Vec<User>> {
        Ok(self
            .sorted(params.sort)
            .into_iter()
            .skip(usize::try_from(params.skip()).unwrap_or(usize::MAX))
            .take(usize::try_from(params.limit).unwrap_or(usize::MAX))
            .collect())
    }

    async fn get(&self, id: &str) -> Result<Option<User>> {
        Ok(self.users.get(id).map(|u| u.value().clone()))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let id = match self.emails.get(email) {
            Some(id) => id.value().clone(),
            None => return Ok(None),
        };
        self.get(&id).await
    }

    async fn find_active(&self) -> Result<Vec<User>> {
        Ok(self
            .sorted(None)
            .into_iter()
            .filter(|u| u.is_active)
            .collect())
    }

    async fn insert(&self, user: NewUser) -> Result<User> {
        let now = Utc::now();
        let id = ObjectId::new().to_hex();
        match self.emails.entry(user.email.clone()) {
            Entry::Occupied(_) => Err(SubforgeError::DuplicateEmail(user.email)),
            Entry::Vacant(slot) => {
                slot.insert(id.clone());
                let created = User {
                    id: id.clone(),
                    name: user.name,
                    email: user.email,
                    is_active: true,
                    created_at: now,
                    updated_at: now,
                };
                self.users.insert(id, created.clone());
                Ok(created)
            }
        }
    }

    async fn update(&self, id: &str, update: &UserUpdate) -> Result<Option<User>> {
        let current = match self.users.get(id) {
            Some(u) => u.value().clone(),
            None => return Ok(None),
        };

        if let Some(email) = &update.email {
            if *email != current.email {
                self.reserve_email(id, email)?;
                self.emails.remove(&current.email);
            }
        }

        Ok(self.apply_update(id, update))
    }

    async fn delete(&self, id: &str) -> Result<Option<User>> {
        match self.users.remove(id) {
            Some((_, user)) => {
                self.emails.remove(&user.email);
                Ok(Some(user))
            }
            None => Ok(None),
        }
    }
}
