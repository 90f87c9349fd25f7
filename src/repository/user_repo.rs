use async_trait::async_trait;
use bson::oid::ObjectId;
use chrono::Utc;
use mongodb::{Client, Collection};
use tracing::error;

use crate::model::lead::timestamp;
use crate::model::user::User;
use crate::repository::repository_error::{RepositoryError, RepositoryResult};

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn insert(&self, user: User) -> RepositoryResult<User>;
    async fn find_by_email(&self, email: &str) -> RepositoryResult<Option<User>>;
}

pub struct UserRepositoryImpl {
    collection: Collection<User>,
}

impl UserRepositoryImpl {
    pub fn new(client: &Client, database: &str, collection_name: &str) -> Self {
        let collection = client.database(database).collection::<User>(collection_name);
        UserRepositoryImpl { collection }
    }
}

#[async_trait]
impl UserRepository for UserRepositoryImpl {
    async fn insert(&self, mut user: User) -> RepositoryResult<User> {
        user.id = Some(ObjectId::new());
        let now = timestamp(Utc::now());
        user.created_at = Some(now.clone());
        user.updated_at = Some(now);
        self.collection.insert_one(&user, None).await.map_err(|e| {
            error!("Failed to insert user: {}", e);
            RepositoryError::from(e)
        })?;
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> RepositoryResult<Option<User>> {
        let filter = bson::doc! { "email": email };
        self.collection
            .find_one(filter, None)
            .await
            .map_err(|e| {
                error!("Failed to find user by email: {}", e);
                RepositoryError::from(e)
            })
    }
}
