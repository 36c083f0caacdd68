use serde_json::{Map, Value};

pub const UNEXPECTED_ERROR: &str = "An unexpected error occurred";

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("validation failed: {}", first_field_message(.errors).unwrap_or("unknown field"))]
    Validation { errors: Map<String, Value> },

    #[error("backend returned {status}: {}", .message.as_deref().unwrap_or("no message"))]
    Status { status: u16, message: Option<String> },

    #[error("unexpected response: {0}")]
    Decode(String),

    #[error("local store error: {0}")]
    Store(#[from] rusqlite::Error),

    #[error("invalid form: {0}")]
    Form(#[from] validator::ValidationErrors),

    #[error("no active conversation")]
    NoActiveConversation,

    #[error("message is empty")]
    EmptyMessage,

    #[error("not found: {0}")]
    NotFound(String),
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        ApiError::Decode(e.to_string())
    }
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Validation { .. } => Some(422),
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Text to show the user for a failed call.
    ///
    /// 422 surfaces the first field-level message; other backend failures use
    /// the backend `message` or `fallback`; local failures use a generic text.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            ApiError::Validation { errors } => first_field_message(errors)
                .unwrap_or(fallback)
                .to_string(),
            ApiError::Status { message, .. } => message.clone().unwrap_or_else(|| fallback.to_string()),
            ApiError::Http(_) => fallback.to_string(),
            ApiError::Form(errors) => first_form_message(errors).unwrap_or_else(|| fallback.to_string()),
            ApiError::NoActiveConversation | ApiError::EmptyMessage | ApiError::NotFound(_) => {
                self.to_string()
            }
            ApiError::Decode(_) | ApiError::Store(_) => UNEXPECTED_ERROR.to_string(),
        }
    }
}

/// First message of the first field in a backend `errors` object.
pub fn first_field_message(errors: &Map<String, Value>) -> Option<&str> {
    let (_, first) = errors.iter().next()?;
    match first {
        Value::Array(items) => items.first().and_then(Value::as_str),
        Value::String(s) => Some(s.as_str()),
        _ => None,
    }
}

fn first_form_message(errors: &validator::ValidationErrors) -> Option<String> {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));
    fields.into_iter().find_map(|(_, errs)| {
        errs.first().map(|e| {
            e.message
                .as_ref()
                .map(|m| m.to_string())
                .unwrap_or_else(|| e.code.to_string())
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn validation_uses_first_field_message() {
        let err = ApiError::Validation {
            errors: map(json!({
                "email": ["The email has already been taken.", "second"],
                "password": ["too short"],
            })),
        };
        assert_eq!(err.user_message("Registration failed"), "The email has already been taken.");
        assert_eq!(err.status(), Some(422));
    }

    #[test]
    fn status_falls_back_when_backend_is_silent() {
        let err = ApiError::Status { status: 500, message: None };
        assert_eq!(err.user_message("Registration failed"), "Registration failed");

        let err = ApiError::Status {
            status: 403,
            message: Some("Forbidden".to_string()),
        };
        assert_eq!(err.user_message("Registration failed"), "Forbidden");
    }

    #[test]
    fn decode_errors_are_generic() {
        let err = ApiError::Decode("bad".to_string());
        assert_eq!(err.user_message("Registration failed"), UNEXPECTED_ERROR);
    }
}
