use super::client::ApiClient;
use super::envelope;
use crate::errors::ApiError;
use crate::models::{Association, AssociationChanges, NewAssociation, NewUser, User, UserChanges};

const USER_KEYS: &[&str] = &["data", "user"];
const USER_LIST_KEYS: &[&str] = &["data", "users"];
const ASSOCIATION_KEYS: &[&str] = &["data", "association"];
const ASSOCIATION_LIST_KEYS: &[&str] = &["data", "associations"];

impl ApiClient {
    // ── Users ──

    pub async fn admin_users(&self) -> Result<Vec<User>, ApiError> {
        let body = self.get("/users").await?;
        envelope::list(body, USER_LIST_KEYS)
    }

    pub async fn admin_user(&self, user_id: i64) -> Result<User, ApiError> {
        let body = self.get(&format!("/users/{user_id}")).await?;
        envelope::object(body, USER_KEYS)
    }

    pub async fn admin_create_user(&self, user: &NewUser) -> Result<User, ApiError> {
        let body = self.post("/users", user).await?;
        envelope::object(body, USER_KEYS)
    }

    pub async fn admin_update_user(&self, user_id: i64, changes: &UserChanges) -> Result<User, ApiError> {
        let body = self.put(&format!("/users/{user_id}"), changes).await?;
        envelope::object(body, USER_KEYS)
    }

    pub async fn admin_delete_user(&self, user_id: i64) -> Result<(), ApiError> {
        self.delete(&format!("/users/{user_id}")).await?;
        Ok(())
    }

    pub async fn admin_restore_user(&self, user_id: i64) -> Result<(), ApiError> {
        self.post_empty(&format!("/users/{user_id}/restore")).await?;
        Ok(())
    }

    pub async fn admin_deleted_users(&self) -> Result<Vec<User>, ApiError> {
        let body = self.get("/users/deleted").await?;
        envelope::list(body, USER_LIST_KEYS)
    }

    // ── Associations ──

    pub async fn associations(&self) -> Result<Vec<Association>, ApiError> {
        let body = self.get("/associations").await?;
        envelope::list(body, ASSOCIATION_LIST_KEYS)
    }

    pub async fn admin_create_association(
        &self,
        association: &NewAssociation,
    ) -> Result<Association, ApiError> {
        let body = self.post("/associations", association).await?;
        envelope::object(body, ASSOCIATION_KEYS)
    }

    pub async fn admin_update_association(
        &self,
        association_id: i64,
        changes: &AssociationChanges,
    ) -> Result<Association, ApiError> {
        let body = self
            .put(&format!("/associations/{association_id}"), changes)
            .await?;
        envelope::object(body, ASSOCIATION_KEYS)
    }

    pub async fn admin_delete_association(&self, association_id: i64) -> Result<(), ApiError> {
        self.delete(&format!("/associations/{association_id}")).await?;
        Ok(())
    }
}
