use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::bson::oid::ObjectId;
use mongodb::bson::{self, doc, Document};
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::{IndexOptions, ReturnDocument};
use mongodb::{Collection, Database, IndexModel};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;

use super::UserStore;
use crate::db::MongoDatabase;
use crate::error::{Result, SubforgeError};
use crate::types::{ListParams, NewUser, User, UserUpdate};

pub const USERS_COLLECTION: &str = "users";

const DUPLICATE_KEY: i32 = 11000;

fn default_active() -> bool {
    true
}

/// On-disk shape of a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct UserDocument {
    #[serde(rename = "_id")]
    id: ObjectId,
    name: String,
    email: String,
    #[serde(rename = "isActive", default = "default_active")]
    is_active: bool,
    #[serde(rename = "createdAt")]
    created_at: bson::DateTime,
    #[serde(rename = "updatedAt")]
    updated_at: bson::DateTime,
}

fn to_chrono(dt: bson::DateTime) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp_millis(dt.timestamp_millis()).unwrap_or_default()
}

impl From<UserDocument> for User {
    fn from(d: UserDocument) -> Self {
        User {
            id: d.id.to_hex(),
            name: d.name,
            email: d.email,
            is_active: d.is_active,
            created_at: to_chrono(d.created_at),
            updated_at: to_chrono(d.updated_at),
        }
    }
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(e)) => e.code == DUPLICATE_KEY,
        ErrorKind::Command(e) => e.code == DUPLICATE_KEY,
        _ => false,
    }
}

fn map_write_error(err: mongodb::error::Error, email: &str) -> SubforgeError {
    if is_duplicate_key(&err) {
        SubforgeError::DuplicateEmail(email.to_string())
    } else {
        err.into()
    }
}

/// Unique index on `email`, created on connect when auto-indexing is on.
pub async fn ensure_indexes(db: &Database) -> Result<()> {
    let index = IndexModel::builder()
        .keys(doc! { "email": 1 })
        .options(IndexOptions::builder().unique(true).build())
        .build();
    db.collection::<Document>(USERS_COLLECTION)
        .create_index(index)
        .await?;
    tracing::debug!(collection = USERS_COLLECTION, "ensured unique email index");
    Ok(())
}

/// MongoDB-backed [`UserStore`]. Every operation is bounded by the
/// configured socket timeout.
pub struct MongoUserStore {
    db: Arc<MongoDatabase>,
}

impl MongoUserStore {
    pub fn new(db: Arc<MongoDatabase>) -> Self {
        Self { db }
    }

    async fn collection(&self) -> Result<Collection<UserDocument>> {
        Ok(self.db.database().await?.collection(USERS_COLLECTION))
    }

    async fn bounded<T, F>(&self, op: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let limit = self.db.config().socket_timeout();
        tokio::time::timeout(limit, op).await.map_err(|_| {
            SubforgeError::Database(format!(
                "operation timed out after {}ms",
                limit.as_millis()
            ))
        })?
    }
}

fn object_id(id: &str) -> Result<ObjectId> {
    Ok(ObjectId::parse_str(id)?)
}

#[async_trait]
impl UserStore for MongoUserStore {
    async fn count(&self) -> Result<u64> {
        self.bounded(async {
            let coll = self.collection().await?;
            Ok(coll.count_documents(doc! {}).await?)
        })
        .await
    }

    async fn list(&self, params: &ListParams) -> Result<Vec<User>> {
        self.bounded(async {
            let coll = self.collection().await?;
            let mut sort = Document::new();
            if let Some(field) = params.sort {
                sort.insert(field.key(), 1);
            }
            sort.insert("_id", 1);

            let cursor = coll
                .find(doc! {})
                .sort(sort)
                // sent to the server as int64
                .skip(params.skip().min(i64::MAX as u64))
                .limit(params.limit as i64)
                .await?;
            let docs: Vec<UserDocument> = cursor.try_collect().await?;
            Ok(docs.into_iter().map(User::from).collect())
        })
        .await
    }

    async fn get(&self, id: &str) -> Result<Option<User>> {
        let oid = object_id(id)?;
        self.bounded(async {
            let coll = self.collection().await?;
            Ok(coll.find_one(doc! { "_id": oid }).await?.map(User::from))
        })
        .await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        self.bounded(async {
            let coll = self.collection().await?;
            Ok(coll.find_one(doc! { "email": email }).await?.map(User::from))
        })
        .await
    }

    async fn find_active(&self) -> Result<Vec<User>> {
        self.bounded(async {
            let coll = self.collection().await?;
            let cursor = coll.find(doc! { "isActive": true }).await?;
            let docs: Vec<UserDocument> = cursor.try_collect().await?;
            Ok(docs.into_iter().map(User::from).collect())
        })
        .await
    }

    async fn insert(&self, user: NewUser) -> Result<User> {
        let now = bson::DateTime::now();
        let document = UserDocument {
            id: ObjectId::new(),
            name: user.name,
            email: user.email,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        self.bounded(async {
            let coll = self.collection().await?;
            coll.insert_one(&document)
                .await
                .map_err(|e| map_write_error(e, &document.email))?;
            Ok(User::from(document.clone()))
        })
        .await
    }

    async fn update(&self, id: &str, update: &UserUpdate) -> Result<Option<User>> {
        let oid = object_id(id)?;
        let mut set = doc! { "updatedAt": bson::DateTime::now() };
        if let Some(name) = &update.name {
            set.insert("name", name.as_str());
        }
        if let Some(email) = &update.email {
            set.insert("email", email.as_str());
        }
        let email = update.email.clone().unwrap_or_default();

        self.bounded(async {
            let coll = self.collection().await?;
            let updated = coll
                .find_one_and_update(doc! { "_id": oid }, doc! { "$set": set })
                .return_document(ReturnDocument::After)
                .await
                .map_err(|e| map_write_error(e, &email))?;
            Ok(updated.map(User::from))
        })
        .await
    }

    async fn delete(&self, id: &str) -> Result<Option<User>> {
        let oid = object_id(id)?;
        self.bounded(async {
            let coll = self.collection().await?;
            Ok(coll
                .find_one_and_delete(doc! { "_id": oid })
                .await?
                .map(User::from))
        })
        .await
    }
}
