//! Real-time chat events.
//!
//! The server pushes one event feed per signed-in user; every event names
//! the conversation it belongs to. In-process consumers subscribe through
//! [`EventHub`], a broadcast fan-out layered over the single upstream
//! connection owned by [`EventStream`].

mod stream;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::models::ConversationId;

pub use stream::{parse_sse_frame, EventStream};

/// Capacity of the in-process event fan-out channel
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// One push event from the marketplace server.
///
/// Wire form: `{"event": "meetup_accepted", "conversationId": "..."}`.
/// Payloads may carry more fields; only the conversation scope matters to
/// the client, which refetches rather than applying deltas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ChatEvent {
    #[serde(rename_all = "camelCase")]
    NewMessage { conversation_id: ConversationId },
    #[serde(rename_all = "camelCase")]
    MessagesRead { conversation_id: ConversationId },
    #[serde(rename_all = "camelCase")]
    OfferUpdated { conversation_id: ConversationId },
    #[serde(rename_all = "camelCase")]
    OfferAccepted { conversation_id: ConversationId },
    #[serde(rename_all = "camelCase")]
    OfferRejected { conversation_id: ConversationId },
    #[serde(rename_all = "camelCase")]
    MeetupProposed { conversation_id: ConversationId },
    #[serde(rename_all = "camelCase")]
    MeetupAccepted { conversation_id: ConversationId },
}

impl ChatEvent {
    /// The conversation this event belongs to
    #[must_use]
    pub const fn conversation_id(&self) -> &ConversationId {
        match self {
            Self::NewMessage { conversation_id }
            | Self::MessagesRead { conversation_id }
            | Self::OfferUpdated { conversation_id }
            | Self::OfferAccepted { conversation_id }
            | Self::OfferRejected { conversation_id }
            | Self::MeetupProposed { conversation_id }
            | Self::MeetupAccepted { conversation_id } => conversation_id,
        }
    }

    /// Wire name of the event
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::NewMessage { .. } => "new_message",
            Self::MessagesRead { .. } => "messages_read",
            Self::OfferUpdated { .. } => "offer_updated",
            Self::OfferAccepted { .. } => "offer_accepted",
            Self::OfferRejected { .. } => "offer_rejected",
            Self::MeetupProposed { .. } => "meetup_proposed",
            Self::MeetupAccepted { .. } => "meetup_accepted",
        }
    }
}

/// Process-wide fan-out for [`ChatEvent`]s.
///
/// Cloning shares the underlying channel; per-conversation watchers are
/// additive subscriptions, never separate upstream connections.
#[derive(Debug, Clone)]
pub struct EventHub {
    tx: broadcast::Sender<ChatEvent>,
}

impl EventHub {
    #[must_use]
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self { tx }
    }

    /// Subscribe; the receiver sees events published after this call
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ChatEvent> {
        self.tx.subscribe()
    }

    /// Publish an event to all current subscribers.
    ///
    /// A publish with no subscribers drops the event; that is not an
    /// error, state is refetched on the next subscription anyway.
    pub fn publish(&self, event: ChatEvent) {
        let _ = self.tx.send(event);
    }
}

impl Default for EventHub {
    fn default() -> Self {
        Self::new()
    }
}
