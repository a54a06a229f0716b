//! Per-conversation session cache.
//!
//! Holds the latest authoritative snapshot of one open conversation and
//! recomputes the viewer's action set on demand. Snapshots are replaced
//! wholesale on refresh; overlapping refreshes race harmlessly and the
//! last response wins.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::warn;

use crate::api::ApiClient;
use crate::error::Result;
use crate::events::EventHub;
use crate::models::{ConversationId, ConversationView, Message, UserId};
use crate::negotiation::{project_actions, ActionSet};
use crate::sync::{ConversationSink, ConversationWatcher};

/// Cached view of one open conversation
pub struct ChatSession {
    api: ApiClient,
    conversation_id: ConversationId,
    view: RwLock<Option<ConversationView>>,
    messages: RwLock<Vec<Message>>,
}

impl ChatSession {
    /// Open a conversation: prime the cache from the API and attach a
    /// watcher to `hub`. The watcher keeps the cache fresh until it is
    /// dropped; dropping it also stops any in-flight refresh.
    pub async fn open(
        api: ApiClient,
        hub: &EventHub,
        conversation_id: ConversationId,
    ) -> Result<(Arc<Self>, ConversationWatcher)> {
        let view = api.get_conversation(&conversation_id).await?;
        let messages = api.get_messages(&conversation_id).await?;

        let session = Arc::new(Self {
            api,
            conversation_id,
            view: RwLock::new(Some(view)),
            messages: RwLock::new(messages),
        });
        let watcher = ConversationWatcher::spawn(hub, conversation_id, session.clone());
        Ok((session, watcher))
    }

    #[must_use]
    pub const fn conversation_id(&self) -> ConversationId {
        self.conversation_id
    }

    /// Latest conversation snapshot
    pub async fn view(&self) -> Option<ConversationView> {
        self.view.read().await.clone()
    }

    /// Latest message list
    pub async fn messages(&self) -> Vec<Message> {
        self.messages.read().await.clone()
    }

    /// Project the action set for `viewer` over the current snapshot.
    /// Recomputed on every call, never stored.
    pub async fn actions_for(&self, viewer: &UserId) -> ActionSet {
        let view = self.view.read().await;
        view.as_ref().map_or_else(ActionSet::empty, |view| {
            project_actions(view.offer.as_ref(), view.transaction.as_ref(), viewer)
        })
    }
}

impl ConversationSink for ChatSession {
    async fn refresh_conversation(&self) {
        match self.api.get_conversation(&self.conversation_id).await {
            Ok(fresh) => *self.view.write().await = Some(fresh),
            // The previous snapshot stays; the failure is terminal to
            // this refresh only
            Err(error) => {
                warn!(conversation = %self.conversation_id, "conversation refresh failed: {error}");
            }
        }
    }

    async fn refresh_messages(&self) {
        match self.api.get_messages(&self.conversation_id).await {
            Ok(fresh) => *self.messages.write().await = fresh,
            Err(error) => {
                warn!(conversation = %self.conversation_id, "message refresh failed: {error}");
            }
        }
    }
}
