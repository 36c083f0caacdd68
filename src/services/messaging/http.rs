use async_trait::async_trait;

use super::ChatBackend;
use crate::api::{envelope, ApiClient};
use crate::errors::ApiError;
use crate::models::{Message, SendMessageRequest};

const MESSAGE_LIST_KEYS: &[&str] = &["messages", "data"];

#[async_trait]
impl ChatBackend for ApiClient {
    async fn user_messages(&self) -> Result<Vec<Message>, ApiError> {
        let body = self.get("/messages").await?;
        envelope::list(body, MESSAGE_LIST_KEYS)
    }

    async fn conversation(&self, counterpart_id: i64) -> Result<Vec<Message>, ApiError> {
        let body = self
            .get(&format!("/messages/conversation/{counterpart_id}"))
            .await?;
        envelope::list(body, MESSAGE_LIST_KEYS)
    }

    async fn send_to_association(&self, association_id: i64, content: &str) -> Result<Option<i64>, ApiError> {
        let body = self
            .post(
                &format!("/messages/association/{association_id}"),
                &SendMessageRequest {
                    message_content: content,
                },
            )
            .await?;
        Ok(envelope::id(&body, &["data", "message"]))
    }

    async fn mark_read(&self, counterpart_id: i64) -> Result<(), ApiError> {
        self.post_empty(&format!("/messages/conversation/{counterpart_id}/read"))
            .await?;
        Ok(())
    }
}
