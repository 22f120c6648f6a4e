//! Direct messages
//!
//! GET  /api/messages/conversations  - one entry per counterpart, latest message
//! GET  /api/messages/{username}     - full conversation with one user
//! POST /api/messages/{username}     - send (form-encoded `content`)

use tracing::info;

use super::{segment, ApiClient};
use crate::error::Result;
use crate::models::wire::{RawConversation, RawMessage};

impl ApiClient {
    pub async fn list_conversations(&self) -> Result<Vec<RawConversation>> {
        self.send_json(self.get("/api/messages/conversations"), "list_conversations")
            .await
    }

    pub async fn get_conversation(&self, username: &str) -> Result<Vec<RawMessage>> {
        self.send_json(
            self.get(&format!("/api/messages/{}", segment(username))),
            "get_conversation",
        )
        .await
    }

    pub async fn send_message(&self, username: &str, content: &str) -> Result<RawMessage> {
        let message: RawMessage = self
            .send_json(
                self.post(&format!("/api/messages/{}", segment(username)))
                    .form(&[("content", content)]),
                "send_message",
            )
            .await?;
        info!(message_id = message.id, to = username, "Message sent");
        Ok(message)
    }
}
