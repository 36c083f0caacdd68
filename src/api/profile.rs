use serde::Serialize;

use super::client::ApiClient;
use super::envelope;
use crate::errors::ApiError;
use crate::models::{Association, AssociationCategory, User};

/// Body for `PUT /me`.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct UserProfileUpdate {
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password_confirmation: Option<String>,
}

/// Body for `PUT /my-association`.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AssociationProfileUpdate {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub description: String,
    pub category: Option<AssociationCategory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password_confirmation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
}

impl ApiClient {
    pub async fn me(&self) -> Result<User, ApiError> {
        let body = self.get("/me").await?;
        envelope::object(body, &["data", "user"])
    }

    pub async fn update_me(&self, update: &UserProfileUpdate) -> Result<User, ApiError> {
        let body = self.put("/me", update).await?;
        envelope::object(body, &["data", "user"])
    }

    pub async fn my_association(&self) -> Result<Association, ApiError> {
        let body = self.get("/my-association").await?;
        envelope::association(body)
    }

    /// The backend does not always echo the association back, so a body
    /// without one is `None` rather than an error.
    pub async fn update_my_association(
        &self,
        update: &AssociationProfileUpdate,
    ) -> Result<Option<Association>, ApiError> {
        let body = self.put("/my-association", update).await?;
        Ok(envelope::association(body).ok())
    }

    /// `DELETE /users/{id}` when an id is given, otherwise `DELETE /me`.
    pub async fn delete_account(&self, user_id: Option<i64>) -> Result<(), ApiError> {
        let path = match user_id {
            Some(id) => format!("/users/{id}"),
            None => "/me".to_string(),
        };
        self.delete(&path).await?;
        Ok(())
    }
}
