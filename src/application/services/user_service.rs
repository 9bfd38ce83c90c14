//! Account self-service and admin user management.

use serde_json::{Map, Value, json};
use uuid::Uuid;

use crate::application::services::ResourceService;
use crate::domain::entities::{User, UserPatch};
use crate::domain::query::{Filter, QueryParams};
use crate::domain::repositories::Collection;
use crate::error::AppError;

#[derive(Clone)]
pub struct UserService {
    users: ResourceService<User>,
}

impl UserService {
    pub fn new(users: Collection<User>) -> Self {
        Self {
            users: ResourceService::new(users),
        }
    }

    pub async fn find_many(&self, params: &QueryParams) -> Result<Vec<Value>, AppError> {
        self.users.find_many(params, Filter::new()).await
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Value, AppError> {
        let user = self.users.find_by_id(id).await?;
        ResourceService::present(&user)
    }

    /// The authenticated user's own profile.
    pub fn me(&self, user: &User) -> Result<Value, AppError> {
        ResourceService::present(user)
    }

    /// Updates the caller's name, email or photo. Roles cannot be changed here.
    pub async fn update_me(&self, user: &User, mut patch: UserPatch) -> Result<Value, AppError> {
        patch.role = None;
        let updated = self.users.update_by_id(user.id, patch).await?;
        ResourceService::present(&updated)
    }

    /// Deactivates the caller's account. Deactivated accounts disappear from
    /// every read and can no longer authenticate.
    pub async fn delete_me(&self, user: &User) -> Result<(), AppError> {
        let mut changes = Map::new();
        changes.insert("active".to_string(), json!(false));
        self.users.update_fields(user.id, changes).await?;

        tracing::info!(user = %user.id, "Account deactivated");
        Ok(())
    }

    pub async fn update(&self, id: Uuid, patch: UserPatch) -> Result<Value, AppError> {
        let updated = self.users.update_by_id(id, patch).await?;
        ResourceService::present(&updated)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        self.users.delete_by_id(id).await?;
        Ok(())
    }
}
