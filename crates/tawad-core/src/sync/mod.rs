//! Per-conversation synchronization.
//!
//! An open conversation attaches a watcher to the shared [`EventHub`].
//! When an event scoped to that conversation arrives, the watcher
//! refetches the authoritative records through its sink; events for other
//! conversations are ignored. State is always refetched, never patched
//! from event payloads, so duplicate and out-of-order delivery is
//! harmless.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::events::{ChatEvent, EventHub};
use crate::models::ConversationId;

/// Receiving side of a conversation refresh.
///
/// Implementations refetch authoritative state and replace any cached
/// copy wholesale; both methods must be idempotent, and racing calls must
/// be safe (last response wins).
pub trait ConversationSink: Send + Sync + 'static {
    /// Refetch the conversation composite (offer, transaction, product, peer)
    fn refresh_conversation(&self) -> impl Future<Output = ()> + Send;

    /// Refetch the message list
    fn refresh_messages(&self) -> impl Future<Output = ()> + Send;
}

/// Scoped subscription of one open conversation to the event hub.
///
/// Spawned when the conversation becomes active and stopped when it goes
/// away. Dropping the watcher detaches it; no sink method runs after
/// teardown, including refreshes already in flight.
pub struct ConversationWatcher {
    handle: JoinHandle<()>,
}

impl ConversationWatcher {
    /// Attach `sink` to `hub` for events scoped to `conversation_id`.
    pub fn spawn<S: ConversationSink>(
        hub: &EventHub,
        conversation_id: ConversationId,
        sink: Arc<S>,
    ) -> Self {
        let mut rx = hub.subscribe();
        let handle = tokio::spawn(async move {
            loop {
                let event = match rx.recv().await {
                    Ok(event) => event,
                    Err(RecvError::Lagged(missed)) => {
                        warn!(missed, conversation = %conversation_id, "event receiver lagged");
                        continue;
                    }
                    Err(RecvError::Closed) => break,
                };

                if *event.conversation_id() != conversation_id {
                    continue;
                }

                debug!(
                    event = event.name(),
                    conversation = %conversation_id,
                    "refreshing from event"
                );

                match event {
                    ChatEvent::NewMessage { .. } | ChatEvent::MessagesRead { .. } => {
                        sink.refresh_messages().await;
                    }
                    ChatEvent::OfferUpdated { .. }
                    | ChatEvent::OfferAccepted { .. }
                    | ChatEvent::OfferRejected { .. }
                    | ChatEvent::MeetupProposed { .. }
                    | ChatEvent::MeetupAccepted { .. } => {
                        sink.refresh_conversation().await;
                        sink.refresh_messages().await;
                    }
                }
            }
        });

        Self { handle }
    }

    /// Detach from the hub. Idempotent.
    pub fn stop(&self) {
        self.handle.abort();
    }
}

impl Drop for ConversationWatcher {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use tokio::time::sleep;

    use super::*;

    #[derive(Default)]
    struct CountingSink {
        conversation_refreshes: AtomicUsize,
        message_refreshes: AtomicUsize,
        refresh_delay: Option<Duration>,
    }

    impl CountingSink {
        fn slow(delay: Duration) -> Self {
            Self {
                refresh_delay: Some(delay),
                ..Self::default()
            }
        }
    }

    impl ConversationSink for CountingSink {
        async fn refresh_conversation(&self) {
            if let Some(delay) = self.refresh_delay {
                sleep(delay).await;
            }
            self.conversation_refreshes.fetch_add(1, Ordering::SeqCst);
        }

        async fn refresh_messages(&self) {
            if let Some(delay) = self.refresh_delay {
                sleep(delay).await;
            }
            self.message_refreshes.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn meetup_event_refreshes_conversation_and_messages() {
        let hub = EventHub::new();
        let conversation_id = ConversationId::new();
        let sink = Arc::new(CountingSink::default());
        let watcher = ConversationWatcher::spawn(&hub, conversation_id, sink.clone());

        hub.publish(ChatEvent::MeetupAccepted { conversation_id });
        sleep(Duration::from_millis(50)).await;

        assert_eq!(sink.conversation_refreshes.load(Ordering::SeqCst), 1);
        assert_eq!(sink.message_refreshes.load(Ordering::SeqCst), 1);
        watcher.stop();
    }

    #[tokio::test]
    async fn message_events_refresh_messages_only() {
        let hub = EventHub::new();
        let conversation_id = ConversationId::new();
        let sink = Arc::new(CountingSink::default());
        let _watcher = ConversationWatcher::spawn(&hub, conversation_id, sink.clone());

        hub.publish(ChatEvent::NewMessage { conversation_id });
        hub.publish(ChatEvent::MessagesRead { conversation_id });
        sleep(Duration::from_millis(50)).await;

        assert_eq!(sink.conversation_refreshes.load(Ordering::SeqCst), 0);
        assert_eq!(sink.message_refreshes.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn events_for_other_conversations_are_ignored() {
        let hub = EventHub::new();
        let watched = ConversationId::new();
        let sink = Arc::new(CountingSink::default());
        let _watcher = ConversationWatcher::spawn(&hub, watched, sink.clone());

        hub.publish(ChatEvent::MeetupAccepted {
            conversation_id: ConversationId::new(),
        });
        hub.publish(ChatEvent::NewMessage {
            conversation_id: ConversationId::new(),
        });
        sleep(Duration::from_millis(50)).await;

        assert_eq!(sink.conversation_refreshes.load(Ordering::SeqCst), 0);
        assert_eq!(sink.message_refreshes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn duplicate_events_trigger_idempotent_refetches() {
        let hub = EventHub::new();
        let conversation_id = ConversationId::new();
        let sink = Arc::new(CountingSink::default());
        let _watcher = ConversationWatcher::spawn(&hub, conversation_id, sink.clone());

        hub.publish(ChatEvent::MeetupProposed { conversation_id });
        hub.publish(ChatEvent::MeetupProposed { conversation_id });
        sleep(Duration::from_millis(50)).await;

        // Each delivery triggers its own refetch; the refetch itself is
        // idempotent so the duplicate is harmless
        assert_eq!(sink.conversation_refreshes.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn teardown_cancels_in_flight_refresh() {
        let hub = EventHub::new();
        let conversation_id = ConversationId::new();
        let sink = Arc::new(CountingSink::slow(Duration::from_millis(200)));
        let watcher = ConversationWatcher::spawn(&hub, conversation_id, sink.clone());

        hub.publish(ChatEvent::OfferAccepted { conversation_id });
        // Let the watcher enter the slow refresh, then tear it down
        sleep(Duration::from_millis(50)).await;
        drop(watcher);
        sleep(Duration::from_millis(300)).await;

        assert_eq!(sink.conversation_refreshes.load(Ordering::SeqCst), 0);
        assert_eq!(sink.message_refreshes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn no_refresh_after_stop() {
        let hub = EventHub::new();
        let conversation_id = ConversationId::new();
        let sink = Arc::new(CountingSink::default());
        let watcher = ConversationWatcher::spawn(&hub, conversation_id, sink.clone());

        watcher.stop();
        sleep(Duration::from_millis(10)).await;
        hub.publish(ChatEvent::MeetupAccepted { conversation_id });
        sleep(Duration::from_millis(50)).await;

        assert_eq!(sink.conversation_refreshes.load(Ordering::SeqCst), 0);
    }
}
