//! Conversation and message endpoints

use serde::Serialize;

use crate::api::ApiClient;
use crate::error::Result;
use crate::models::{ConversationId, ConversationView, Message, MessageType};

/// Body for the send-message endpoint
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutgoingMessage {
    pub conversation_id: ConversationId,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_type: Option<MessageType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl OutgoingMessage {
    /// A plain text message
    #[must_use]
    pub fn text(conversation_id: ConversationId, content: impl Into<String>) -> Self {
        Self {
            conversation_id,
            content: content.into(),
            message_type: Some(MessageType::Text),
            image_url: None,
        }
    }
}

impl ApiClient {
    /// Fetch the composite view of a conversation: offer, transaction,
    /// product, and the other participant
    pub async fn get_conversation(&self, id: &ConversationId) -> Result<ConversationView> {
        let response = self
            .send(
                self.http()
                    .get(self.url(&format!("/messages/get-conversation/{id}"))),
            )
            .await?;
        Ok(response.json::<ConversationView>().await?)
    }

    /// Fetch the messages of a conversation, oldest first
    pub async fn get_messages(&self, id: &ConversationId) -> Result<Vec<Message>> {
        let response = self
            .send(
                self.http()
                    .get(self.url(&format!("/messages/get-messages/{id}"))),
            )
            .await?;
        Ok(response.json::<Vec<Message>>().await?)
    }

    /// Send a chat message
    pub async fn send_message(&self, message: &OutgoingMessage) -> Result<Message> {
        let response = self
            .send(
                self.http()
                    .post(self.url("/messages/send-message"))
                    .json(message),
            )
            .await?;
        Ok(response.json::<Message>().await?)
    }

    /// Mark every message of a conversation as read
    pub async fn mark_messages_read(&self, id: &ConversationId) -> Result<()> {
        self.send(
            self.http()
                .post(self.url(&format!("/messages/mark-messages-as-read/{id}"))),
        )
        .await?;
        Ok(())
    }
}
