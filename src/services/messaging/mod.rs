pub mod http;

use async_trait::async_trait;

use crate::errors::ApiError;
use crate::models::Message;

/// Messaging endpoints the chat view depends on.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Every message visible to the logged-in account.
    async fn user_messages(&self) -> Result<Vec<Message>, ApiError>;

    async fn conversation(&self, counterpart_id: i64) -> Result<Vec<Message>, ApiError>;

    /// Any success counts as delivered. Returns the server id when the
    /// response carries one.
    async fn send_to_association(&self, association_id: i64, content: &str) -> Result<Option<i64>, ApiError>;

    async fn mark_read(&self, counterpart_id: i64) -> Result<(), ApiError>;
}
