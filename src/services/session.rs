use crate::api::{ApiClient, LoginResponse};
use crate::db::{self, queries, Store};
use crate::errors::ApiError;
use crate::models::{ParticipantType, Theme, UserType, Viewer};

/// Stores the token and account details from a successful login.
pub async fn login(api: &ApiClient, email: &str, password: &str) -> Result<LoginResponse, ApiError> {
    let resp = api.login(email, password).await.inspect_err(|e| {
        tracing::error!(error = %e, "login failed");
    })?;

    {
        let conn = db::lock(api.store());
        queries::set_setting(&conn, queries::TOKEN_KEY, &resp.token)?;
        match resp.user_type {
            Some(user_type) => queries::set_setting(&conn, queries::USER_TYPE_KEY, user_type.as_str())?,
            None => {
                queries::remove_setting(&conn, queries::USER_TYPE_KEY)?;
            }
        }
        queries::set_setting(&conn, queries::USER_KEY, &resp.user.to_string())?;
    }

    tracing::info!(user_type = ?resp.user_type, "logged in");
    Ok(resp)
}

/// Ends the session. Local credentials are cleared even when the backend
/// call fails; that failure is still returned.
pub async fn logout(api: &ApiClient) -> Result<(), ApiError> {
    let result = api.logout().await;
    if let Err(e) = &result {
        tracing::error!(error = %e, "logout failed, clearing local session anyway");
    }

    {
        let conn = db::lock(api.store());
        queries::clear_session(&conn)?;
    }
    result
}

pub fn is_logged_in(store: &Store) -> Result<bool, ApiError> {
    let conn = db::lock(store);
    Ok(queries::get_setting(&conn, queries::TOKEN_KEY)?.is_some())
}

pub fn user_type(store: &Store) -> Result<Option<UserType>, ApiError> {
    let conn = db::lock(store);
    Ok(queries::get_setting(&conn, queries::USER_TYPE_KEY)?
        .as_deref()
        .and_then(UserType::parse))
}

/// The stored user object, as returned at login.
pub fn stored_user(store: &Store) -> Result<Option<serde_json::Value>, ApiError> {
    let conn = db::lock(store);
    match queries::get_setting(&conn, queries::USER_KEY)? {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

/// The logged-in account as a chat participant.
pub fn viewer(store: &Store) -> Result<Option<Viewer>, ApiError> {
    let id = stored_user(store)?.and_then(|u| u.get("id").and_then(serde_json::Value::as_i64));
    let kind = match user_type(store)? {
        Some(UserType::Association) => ParticipantType::Association,
        _ => ParticipantType::User,
    };
    Ok(id.map(|id| Viewer { id, kind }))
}

pub fn theme(store: &Store, default: Theme) -> Result<Theme, ApiError> {
    let conn = db::lock(store);
    Ok(queries::get_setting(&conn, queries::THEME_KEY)?
        .map(|t| Theme::parse(&t))
        .unwrap_or(default))
}

pub fn toggle_theme(store: &Store, default: Theme) -> Result<Theme, ApiError> {
    let next = theme(store, default)?.toggled();
    let conn = db::lock(store);
    queries::set_setting(&conn, queries::THEME_KEY, next.as_str())?;
    tracing::debug!(theme = next.as_str(), "theme changed");
    Ok(next)
}
