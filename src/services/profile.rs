use std::borrow::Cow;

use validator::{Validate, ValidationError, ValidationErrors};

use crate::api::{ApiClient, AssociationProfileUpdate, UserProfileUpdate};
use crate::db::{self, queries};
use crate::errors::ApiError;
use crate::models::{Association, AssociationCategory, User};
use crate::services::password::validate_password;

pub const USER_UPDATE_FAILED: &str = "Couldn't update profile. Please try again.";
pub const ASSOCIATION_UPDATE_FAILED: &str = "Couldn't update association profile. Please try again.";
pub const DELETE_FAILED: &str = "Couldn't delete account. Please try again.";

fn blank_to_none(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Runs the derived rules, then requires a matching confirmation when a new
/// password was entered. The mismatch is reported on `confirm_password`.
fn validate_with_confirmation<T: Validate>(
    form: &T,
    password: Option<&str>,
    confirmation: Option<&str>,
) -> Result<(), ValidationErrors> {
    let mut errors = form.validate().err().unwrap_or_else(ValidationErrors::new);
    if let Some(password) = password {
        if confirmation != Some(password) {
            errors.add(
                "confirm_password",
                ValidationError::new("must_match").with_message(Cow::Borrowed("Passwords don't match")),
            );
        }
    }
    if errors.errors().is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Profile edit for donor and recipient accounts. The password pair is only
/// checked and sent when a new password was entered.
#[derive(Debug, Clone, Default, Validate)]
pub struct UserProfileForm {
    #[validate(length(min = 2, message = "First name must be at least 2 characters"))]
    pub first_name: String,
    #[validate(length(min = 2, message = "Last name must be at least 2 characters"))]
    pub last_name: String,
    pub phone: String,
    pub address: String,
    #[validate(custom(function = "validate_password"))]
    pub password: Option<String>,
    pub confirm_password: Option<String>,
}

impl UserProfileForm {
    pub fn from_user(user: &User) -> Self {
        Self {
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            phone: user.phone.clone().unwrap_or_default(),
            address: user.address.clone().unwrap_or_default(),
            password: None,
            confirm_password: None,
        }
    }

    pub fn into_update(self) -> Result<UserProfileUpdate, ApiError> {
        let form = Self {
            password: blank_to_none(self.password),
            confirm_password: blank_to_none(self.confirm_password),
            ..self
        };
        validate_with_confirmation(
            &form,
            form.password.as_deref(),
            form.confirm_password.as_deref(),
        )?;

        let password_confirmation = form.password.as_ref().and(form.confirm_password);
        Ok(UserProfileUpdate {
            first_name: form.first_name,
            last_name: form.last_name,
            phone: form.phone,
            address: form.address,
            password: form.password,
            password_confirmation,
        })
    }
}

#[derive(Debug, Clone, Default, Validate)]
pub struct AssociationProfileForm {
    #[validate(length(min = 2, message = "Organization name is required"))]
    pub name: String,
    #[validate(email(message = "Please enter a valid email"))]
    pub email: String,
    pub phone: String,
    pub address: String,
    pub description: String,
    pub category: Option<AssociationCategory>,
    pub logo_url: Option<String>,
    #[validate(custom(function = "validate_password"))]
    pub password: Option<String>,
    pub confirm_password: Option<String>,
}

impl AssociationProfileForm {
    pub fn from_association(association: &Association) -> Self {
        Self {
            name: association.name.clone(),
            email: association.email.clone(),
            phone: association.phone.clone().unwrap_or_default(),
            address: association.address.clone().unwrap_or_default(),
            description: association.description.clone().unwrap_or_default(),
            category: association.category,
            logo_url: association.logo_url.clone(),
            password: None,
            confirm_password: None,
        }
    }

    pub fn into_update(self) -> Result<AssociationProfileUpdate, ApiError> {
        let form = Self {
            password: blank_to_none(self.password),
            confirm_password: blank_to_none(self.confirm_password),
            ..self
        };
        validate_with_confirmation(
            &form,
            form.password.as_deref(),
            form.confirm_password.as_deref(),
        )?;

        let password_confirmation = form.password.as_ref().and(form.confirm_password);
        Ok(AssociationProfileUpdate {
            name: form.name,
            email: form.email,
            phone: form.phone,
            address: form.address,
            description: form.description,
            category: form.category,
            password: form.password,
            password_confirmation,
            logo_url: form.logo_url,
        })
    }
}

pub async fn update_user_profile(api: &ApiClient, form: UserProfileForm) -> Result<User, ApiError> {
    let update = form.into_update()?;
    let user = api.update_me(&update).await.inspect_err(|e| {
        tracing::error!(error = %e, "profile update failed");
    })?;
    tracing::info!(user_id = user.id, "profile updated");
    Ok(user)
}

/// Sends the edit and merges the echoed association over `current`; fields
/// the backend leaves out or blank keep their current value.
pub async fn update_association_profile(
    api: &ApiClient,
    current: &Association,
    form: AssociationProfileForm,
) -> Result<Association, ApiError> {
    let update = form.into_update()?;
    let echoed = api.update_my_association(&update).await.inspect_err(|e| {
        tracing::error!(error = %e, "association update failed");
    })?;

    Ok(match echoed {
        Some(updated) => merge_association(current, updated),
        None => current.clone(),
    })
}

fn keep_if_blank(new: Option<String>, old: &Option<String>) -> Option<String> {
    blank_to_none(new).or_else(|| old.clone())
}

fn merge_association(current: &Association, updated: Association) -> Association {
    Association {
        id: current.id,
        name: if updated.name.is_empty() {
            current.name.clone()
        } else {
            updated.name
        },
        email: if updated.email.is_empty() {
            current.email.clone()
        } else {
            updated.email
        },
        description: keep_if_blank(updated.description, &current.description),
        phone: keep_if_blank(updated.phone, &current.phone),
        address: keep_if_blank(updated.address, &current.address),
        category: updated.category.or(current.category),
        logo_url: keep_if_blank(updated.logo_url, &current.logo_url),
        created_at: current.created_at.clone(),
        updated_at: updated.updated_at.or_else(|| current.updated_at.clone()),
        deleted_at: current.deleted_at.clone(),
    }
}

/// Deletes the account and, when it was the caller's own, the local session.
pub async fn delete_account(api: &ApiClient, user_id: Option<i64>) -> Result<(), ApiError> {
    api.delete_account(user_id).await.inspect_err(|e| {
        tracing::error!(error = %e, "account deletion failed");
    })?;

    if user_id.is_none() {
        let conn = db::lock(api.store());
        queries::clear_session(&conn)?;
    }
    tracing::info!(user_id = ?user_id, "account deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_form() -> UserProfileForm {
        UserProfileForm {
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            phone: "555".into(),
            address: "1 Main St".into(),
            password: None,
            confirm_password: None,
        }
    }

    #[test]
    fn password_is_optional() {
        let update = user_form().into_update().unwrap();
        assert_eq!(update.password, None);
        assert_eq!(update.password_confirmation, None);

        let mut form = user_form();
        form.password = Some(String::new());
        form.confirm_password = Some(String::new());
        assert!(form.into_update().unwrap().password.is_none());
    }

    #[test]
    fn new_password_follows_signup_rules() {
        let mut form = user_form();
        form.password = Some("weak".into());
        form.confirm_password = Some("weak".into());
        assert!(matches!(form.into_update(), Err(ApiError::Form(_))));

        let mut form = user_form();
        form.password = Some("Abcdef12".into());
        form.confirm_password = Some("Abcdef99".into());
        let err = form.into_update().unwrap_err();
        assert_eq!(err.user_message(USER_UPDATE_FAILED), "Passwords don't match");

        let mut form = user_form();
        form.password = Some("Abcdef12".into());
        form.confirm_password = Some(String::new());
        assert!(form.into_update().is_err());

        let mut form = user_form();
        form.password = Some("Abcdef12".into());
        form.confirm_password = Some("Abcdef12".into());
        let update = form.into_update().unwrap();
        assert_eq!(update.password_confirmation.as_deref(), Some("Abcdef12"));
    }

    #[test]
    fn association_password_needs_confirmation() {
        let mut form = AssociationProfileForm {
            name: "Food Bank".into(),
            email: "fb@example.com".into(),
            ..Default::default()
        };
        assert!(form.clone().into_update().unwrap().password.is_none());

        form.password = Some("Abcdef12".into());
        form.confirm_password = Some("Abcdef13".into());
        match form.clone().into_update() {
            Err(ApiError::Form(errors)) => {
                assert!(errors.field_errors().contains_key("confirm_password"))
            }
            other => panic!("expected form error, got {other:?}"),
        }

        form.confirm_password = Some("Abcdef12".into());
        let update = form.into_update().unwrap();
        assert_eq!(update.password_confirmation.as_deref(), Some("Abcdef12"));
    }

    #[test]
    fn short_names_are_rejected() {
        let mut form = user_form();
        form.first_name = "A".into();
        let err = form.into_update().unwrap_err();
        assert_eq!(
            err.user_message(USER_UPDATE_FAILED),
            "First name must be at least 2 characters"
        );
    }

    #[test]
    fn merge_keeps_current_values_for_blank_echo() {
        let current = Association {
            id: 3,
            name: "Food Bank".into(),
            email: "fb@example.com".into(),
            description: Some("We feed people".into()),
            phone: Some("555".into()),
            address: Some("1 Main St".into()),
            category: Some(AssociationCategory::Food),
            logo_url: None,
            created_at: None,
            updated_at: None,
            deleted_at: None,
        };
        let mut echoed = current.clone();
        echoed.name = "Food Bank North".into();
        echoed.description = Some(String::new());
        echoed.category = None;

        let merged = merge_association(&current, echoed);
        assert_eq!(merged.name, "Food Bank North");
        assert_eq!(merged.description.as_deref(), Some("We feed people"));
        assert_eq!(merged.category, Some(AssociationCategory::Food));
    }
}
