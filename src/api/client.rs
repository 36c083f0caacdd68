use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::Method;
use serde::Serialize;
use serde_json::Value;

use crate::config::AppConfig;
use crate::db::{self, queries, Store};
use crate::errors::ApiError;

/// Shared HTTP client for the donation backend.
///
/// The bearer token is read from the local store on every request, so a
/// login or logout takes effect without rebuilding the client.
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    client: reqwest::Client,
    store: Store,
}

impl ApiClient {
    pub fn new(config: &AppConfig, store: Store) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            base_url: config.api_url.trim_end_matches('/').to_string(),
            client,
            store,
        })
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    fn token(&self) -> Result<Option<String>, ApiError> {
        let conn = db::lock(&self.store);
        Ok(queries::get_setting(&conn, queries::TOKEN_KEY)?)
    }

    pub async fn get(&self, path: &str) -> Result<Value, ApiError> {
        self.send::<()>(Method::GET, path, None).await
    }

    pub async fn delete(&self, path: &str) -> Result<Value, ApiError> {
        self.send::<()>(Method::DELETE, path, None).await
    }

    pub async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<Value, ApiError> {
        self.send(Method::POST, path, Some(body)).await
    }

    pub async fn post_empty(&self, path: &str) -> Result<Value, ApiError> {
        self.send::<()>(Method::POST, path, None).await
    }

    pub async fn put<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<Value, ApiError> {
        self.send(Method::PUT, path, Some(body)).await
    }

    pub async fn patch<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<Value, ApiError> {
        self.send(Method::PATCH, path, Some(body)).await
    }

    async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<Value, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        let mut req = self.client.request(method.clone(), &url);

        if let Some(token) = self.token()? {
            req = req.bearer_auth(token);
        }
        if let Some(body) = body {
            req = req.json(body);
        }

        let resp = req.send().await?;
        let status = resp.status();
        let bytes = resp.bytes().await?;

        tracing::debug!(method = %method, path, status = status.as_u16(), "api call");

        if !status.is_success() {
            let data: Value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
            tracing::warn!(method = %method, path, status = status.as_u16(), "api call failed");
            return Err(error_from_response(status.as_u16(), data));
        }

        if bytes.is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_slice(&bytes)?)
    }
}

fn error_from_response(status: u16, data: Value) -> ApiError {
    if status == 422 {
        let errors = data
            .get("errors")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();
        if !errors.is_empty() {
            return ApiError::Validation { errors };
        }
    }

    let message = data
        .get("message")
        .and_then(Value::as_str)
        .map(str::to_string);
    ApiError::Status { status, message }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unprocessable_keeps_field_errors() {
        let err = error_from_response(
            422,
            json!({"message": "The given data was invalid.", "errors": {"email": ["taken"]}}),
        );
        assert!(matches!(err, ApiError::Validation { .. }));
        assert_eq!(err.user_message("x"), "taken");
    }

    #[test]
    fn unprocessable_without_errors_uses_message() {
        let err = error_from_response(422, json!({"message": "nope"}));
        assert_eq!(err.user_message("x"), "nope");
    }

    #[test]
    fn other_status_keeps_backend_message() {
        let err = error_from_response(401, json!({"message": "Unauthenticated."}));
        assert_eq!(err.status(), Some(401));
        assert_eq!(err.user_message("x"), "Unauthenticated.");

        let err = error_from_response(500, Value::Null);
        assert_eq!(err.user_message("Registration failed"), "Registration failed");
    }
}
