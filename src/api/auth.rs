use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::client::ApiClient;
use crate::errors::ApiError;
use crate::models::UserType;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct UserRegistration {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password_confirmation: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub user_type: UserType,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AssociationRegistration {
    pub name: String,
    pub email: String,
    pub password: String,
    pub phone: String,
    pub address: String,
    pub description: Option<String>,
}

/// A signup submission bound to the endpoint that accepts it.
#[derive(Debug, Clone, PartialEq)]
pub enum Registration {
    User(UserRegistration),
    Association(AssociationRegistration),
}

impl Registration {
    pub fn endpoint(&self) -> &'static str {
        match self {
            Registration::User(_) => "/register",
            Registration::Association(_) => "/association/register",
        }
    }

    pub fn body(&self) -> Result<Value, ApiError> {
        let v = match self {
            Registration::User(r) => serde_json::to_value(r)?,
            Registration::Association(r) => serde_json::to_value(r)?,
        };
        Ok(v)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user_type: Option<UserType>,
    pub user: Value,
}

impl ApiClient {
    pub async fn register(&self, registration: &Registration) -> Result<Value, ApiError> {
        let body = registration.body()?;
        self.post(registration.endpoint(), &body).await
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, ApiError> {
        let body = self
            .post("/login", &json!({ "email": email, "password": password }))
            .await?;
        decode_login(body)
    }

    pub async fn logout(&self) -> Result<(), ApiError> {
        self.post_empty("/logout").await?;
        Ok(())
    }
}

/// Accepts `{token, user, user_type}`, `{access_token, ...}` and the same
/// nested under `data`.
fn decode_login(body: Value) -> Result<LoginResponse, ApiError> {
    let root = match body.get("data") {
        Some(data) if data.get("token").is_some() || data.get("access_token").is_some() => data,
        _ => &body,
    };

    let token = root
        .get("token")
        .or_else(|| root.get("access_token"))
        .and_then(Value::as_str)
        .ok_or_else(|| ApiError::Decode("login response carries no token".to_string()))?
        .to_string();

    let user = root.get("user").cloned().unwrap_or(Value::Null);
    let user_type = root
        .get("user_type")
        .or_else(|| user.get("user_type"))
        .and_then(Value::as_str)
        .and_then(UserType::parse);

    Ok(LoginResponse {
        token,
        user_type,
        user,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_follow_payload_kind() {
        let user = Registration::User(UserRegistration {
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            email: "ada@example.com".into(),
            password: "Abcdef12".into(),
            password_confirmation: None,
            phone: None,
            address: None,
            user_type: UserType::Recipient,
        });
        assert_eq!(user.endpoint(), "/register");
        let body = user.body().unwrap();
        assert_eq!(body["user_type"], "recipient");
        assert!(body["phone"].is_null());
        assert!(body.get("password_confirmation").is_none());

        let assoc = Registration::Association(AssociationRegistration {
            name: "Food Bank".into(),
            email: "fb@example.com".into(),
            password: "Abcdef12".into(),
            phone: "555".into(),
            address: "1 Main St".into(),
            description: None,
        });
        assert_eq!(assoc.endpoint(), "/association/register");
        assert_eq!(assoc.body().unwrap()["name"], "Food Bank");
    }

    #[test]
    fn login_shapes() {
        let flat = decode_login(json!({"token": "t1", "user": {"user_type": "donor"}})).unwrap();
        assert_eq!(flat.token, "t1");
        assert_eq!(flat.user_type, Some(UserType::Donor));

        let nested = decode_login(json!({"data": {"access_token": "t2", "user_type": "association"}}))
            .unwrap();
        assert_eq!(nested.token, "t2");
        assert_eq!(nested.user_type, Some(UserType::Association));

        assert!(decode_login(json!({"message": "bad credentials"})).is_err());
    }
}
