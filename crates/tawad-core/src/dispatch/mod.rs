//! Dispatch of user-chosen negotiation actions.
//!
//! Exactly one backend mutation per invocation. Local caches are
//! reconciled by refetching through the sink, never by mutating offer or
//! transaction fields in place. Failures are terminal to the one action:
//! the server's message is surfaced verbatim when present, a generic
//! per-action message otherwise, and nothing is retried.

use std::collections::HashSet;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::Utc;
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::{validate_amount, MeetupProposal, Offer, OfferId, TransactionId};
use crate::sync::ConversationSink;

/// Backend mutations the dispatcher can invoke. [`crate::api::ApiClient`]
/// implements this against the live API; tests substitute an in-memory
/// fake that mirrors the server's transitions.
pub trait NegotiationBackend: Send + Sync + 'static {
    fn accept_offer(&self, id: &OfferId) -> impl Future<Output = Result<Offer>> + Send;

    fn reject_offer(&self, id: &OfferId) -> impl Future<Output = Result<Offer>> + Send;

    fn update_offer(
        &self,
        id: &OfferId,
        new_amount: &str,
    ) -> impl Future<Output = Result<Offer>> + Send;

    fn propose_meetup(
        &self,
        id: &TransactionId,
        proposal: &MeetupProposal,
    ) -> impl Future<Output = Result<()>> + Send;

    fn accept_meetup(&self, id: &TransactionId) -> impl Future<Output = Result<()>> + Send;
}

/// Kind tag used by the per-target in-flight guard and for generic
/// failure messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum ActionKind {
    AcceptOffer,
    RejectOffer,
    UpdateOffer,
    ProposeMeetup,
    AcceptMeetup,
}

impl ActionKind {
    const fn label(self) -> &'static str {
        match self {
            Self::AcceptOffer => "accept-offer",
            Self::RejectOffer => "reject-offer",
            Self::UpdateOffer => "update-offer",
            Self::ProposeMeetup => "propose-meetup",
            Self::AcceptMeetup => "accept-meetup",
        }
    }

    const fn failure_message(self) -> &'static str {
        match self {
            Self::AcceptOffer => "Failed to accept offer",
            Self::RejectOffer => "Failed to reject offer",
            Self::UpdateOffer => "Failed to update offer",
            Self::ProposeMeetup => "Failed to propose meetup",
            Self::AcceptMeetup => "Failed to accept meetup",
        }
    }
}

/// Translates a chosen action into one backend call and reconciles the
/// conversation cache afterwards.
///
/// At most one mutation per action kind per target may be in flight; a
/// concurrent second invocation fails fast with [`Error::ActionPending`].
pub struct ActionDispatcher<B, S> {
    backend: Arc<B>,
    sink: Arc<S>,
    in_flight: Mutex<HashSet<(ActionKind, String)>>,
}

impl<B: NegotiationBackend, S: ConversationSink> ActionDispatcher<B, S> {
    pub fn new(backend: Arc<B>, sink: Arc<S>) -> Self {
        Self {
            backend,
            sink,
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    /// Seller accepts a pending offer
    pub async fn accept_offer(&self, id: &OfferId) -> Result<()> {
        let _guard = self.begin(ActionKind::AcceptOffer, id.as_str())?;
        let result = self.backend.accept_offer(id).await.map(drop);
        self.finish(ActionKind::AcceptOffer, result).await
    }

    /// Seller rejects a pending offer
    pub async fn reject_offer(&self, id: &OfferId) -> Result<()> {
        let _guard = self.begin(ActionKind::RejectOffer, id.as_str())?;
        let result = self.backend.reject_offer(id).await.map(drop);
        self.finish(ActionKind::RejectOffer, result).await
    }

    /// Buyer revises the amount of a pending offer
    pub async fn update_offer(&self, id: &OfferId, new_amount: &str) -> Result<()> {
        validate_amount(new_amount)?;
        let _guard = self.begin(ActionKind::UpdateOffer, id.as_str())?;
        let result = self.backend.update_offer(id, new_amount).await.map(drop);
        self.finish(ActionKind::UpdateOffer, result).await
    }

    /// Propose (or replace) the meetup time and place.
    ///
    /// The proposal is validated client-side first; invalid input never
    /// reaches the wire.
    pub async fn propose_meetup(
        &self,
        id: &TransactionId,
        proposal: &MeetupProposal,
    ) -> Result<()> {
        proposal.validate(Utc::now())?;
        let _guard = self.begin(ActionKind::ProposeMeetup, id.as_str())?;
        let result = self.backend.propose_meetup(id, proposal).await;
        self.finish(ActionKind::ProposeMeetup, result).await
    }

    /// Accept the other party's proposed meetup. Only projected for
    /// non-proposers; the server re-validates regardless.
    pub async fn accept_meetup(&self, id: &TransactionId) -> Result<()> {
        let _guard = self.begin(ActionKind::AcceptMeetup, id.as_str())?;
        let result = self.backend.accept_meetup(id).await;
        self.finish(ActionKind::AcceptMeetup, result).await
    }

    fn begin(&self, kind: ActionKind, target: String) -> Result<InFlightGuard<'_>> {
        let mut pending = self
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if !pending.insert((kind, target.clone())) {
            return Err(Error::ActionPending(format!(
                "{} already in progress for {target}",
                kind.label()
            )));
        }
        Ok(InFlightGuard {
            set: &self.in_flight,
            key: (kind, target),
        })
    }

    async fn finish(&self, kind: ActionKind, result: Result<()>) -> Result<()> {
        match result {
            Ok(()) => {
                self.sink.refresh_conversation().await;
                self.sink.refresh_messages().await;
                Ok(())
            }
            // Server-provided message goes through verbatim
            Err(Error::Api(message)) => Err(Error::Api(message)),
            Err(error) => {
                debug!("{} failed without a server message: {error}", kind.label());
                Err(Error::Api(kind.failure_message().to_string()))
            }
        }
    }
}

/// Releases the in-flight slot on every exit path
struct InFlightGuard<'a> {
    set: &'a Mutex<HashSet<(ActionKind, String)>>,
    key: (ActionKind, String),
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        let mut pending = self.set.lock().unwrap_or_else(PoisonError::into_inner);
        pending.remove(&self.key);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use chrono::{Days, Utc};
    use pretty_assertions::assert_eq;
    use tokio::sync::Notify;
    use tokio::time::sleep;

    use super::*;
    use crate::models::{
        MeetupPoint, MeetupStatus, OfferStatus, Transaction, TransactionStatus, UserId,
    };

    /// Server-side state shared by every fake backend of one test,
    /// mirroring the authoritative transitions
    struct MarketState {
        offer: Offer,
        transaction: Transaction,
    }

    impl MarketState {
        fn accepted(buyer: UserId, seller: UserId) -> Self {
            Self {
                offer: Offer {
                    id: OfferId::new(),
                    amount: "1500.00".to_string(),
                    status: OfferStatus::Accepted,
                    buyer_id: buyer,
                    seller_id: seller,
                },
                transaction: Transaction {
                    id: TransactionId::new(),
                    status: TransactionStatus::Active,
                    meetup_status: MeetupStatus::NotScheduled,
                    scheduled_meetup_at: None,
                    meetup_location: None,
                    meetup_coordinates: None,
                    meetup_proposed_by: None,
                    agreed_price: "1500.00".to_string(),
                    buyer_id: buyer,
                    seller_id: seller,
                },
            }
        }
    }

    /// One signed-in session against the shared market state
    struct FakeBackend {
        acting_user: UserId,
        state: Arc<Mutex<MarketState>>,
        calls: AtomicUsize,
        gate: Option<Arc<Notify>>,
        fail_with: Mutex<Option<Error>>,
    }

    impl FakeBackend {
        fn new(acting_user: UserId, state: Arc<Mutex<MarketState>>) -> Self {
            Self {
                acting_user,
                state,
                calls: AtomicUsize::new(0),
                gate: None,
                fail_with: Mutex::new(None),
            }
        }

        fn gated(acting_user: UserId, state: Arc<Mutex<MarketState>>, gate: Arc<Notify>) -> Self {
            Self {
                gate: Some(gate),
                ..Self::new(acting_user, state)
            }
        }

        fn fail_next(&self, error: Error) {
            *self.fail_with.lock().unwrap() = Some(error);
        }

        async fn enter(&self) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            if let Some(error) = self.fail_with.lock().unwrap().take() {
                return Err(error);
            }
            Ok(())
        }
    }

    impl NegotiationBackend for FakeBackend {
        async fn accept_offer(&self, _id: &OfferId) -> Result<Offer> {
            self.enter().await?;
            let mut state = self.state.lock().unwrap();
            state.offer.status = OfferStatus::Accepted;
            Ok(state.offer.clone())
        }

        async fn reject_offer(&self, _id: &OfferId) -> Result<Offer> {
            self.enter().await?;
            let mut state = self.state.lock().unwrap();
            state.offer.status = OfferStatus::Rejected;
            Ok(state.offer.clone())
        }

        async fn update_offer(&self, _id: &OfferId, new_amount: &str) -> Result<Offer> {
            self.enter().await?;
            let mut state = self.state.lock().unwrap();
            state.offer.amount = new_amount.to_string();
            Ok(state.offer.clone())
        }

        async fn propose_meetup(
            &self,
            _id: &TransactionId,
            proposal: &MeetupProposal,
        ) -> Result<()> {
            self.enter().await?;
            let mut state = self.state.lock().unwrap();
            if !state.transaction.status.is_active() {
                return Err(Error::Api("Transaction is not active".to_string()));
            }
            state.transaction.meetup_status = MeetupStatus::Scheduled;
            state.transaction.scheduled_meetup_at = Some(proposal.scheduled_meetup_at);
            state.transaction.meetup_location = Some(proposal.meetup_location.clone());
            state.transaction.meetup_coordinates = Some(proposal.meetup_coordinates.clone());
            state.transaction.meetup_proposed_by = Some(self.acting_user);
            Ok(())
        }

        async fn accept_meetup(&self, _id: &TransactionId) -> Result<()> {
            self.enter().await?;
            let mut state = self.state.lock().unwrap();
            if state.transaction.meetup_status != MeetupStatus::Scheduled {
                return Err(Error::Api("No meetup proposal to accept".to_string()));
            }
            if state.transaction.meetup_proposed_by == Some(self.acting_user) {
                return Err(Error::Api(
                    "Proposer cannot accept their own meetup".to_string(),
                ));
            }
            state.transaction.meetup_status = MeetupStatus::Confirmed;
            Ok(())
        }
    }

    #[derive(Default)]
    struct CountingSink {
        conversation_refreshes: AtomicUsize,
        message_refreshes: AtomicUsize,
    }

    impl ConversationSink for CountingSink {
        async fn refresh_conversation(&self) {
            self.conversation_refreshes.fetch_add(1, Ordering::SeqCst);
        }

        async fn refresh_messages(&self) {
            self.message_refreshes.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn proposal() -> MeetupProposal {
        MeetupProposal {
            scheduled_meetup_at: Utc::now().checked_add_days(Days::new(3)).unwrap(),
            meetup_location: "Rizal Park".to_string(),
            meetup_coordinates: MeetupPoint {
                lat: 14.5995,
                lng: 120.9842,
                address: "Rizal Park".to_string(),
            },
        }
    }

    #[tokio::test]
    async fn propose_then_accept_confirms_the_meetup() {
        let buyer = UserId::new();
        let seller = UserId::new();
        let state = Arc::new(Mutex::new(MarketState::accepted(buyer, seller)));
        let transaction_id = state.lock().unwrap().transaction.id;

        // Buyer proposes
        let buyer_sink = Arc::new(CountingSink::default());
        let buyer_dispatch = ActionDispatcher::new(
            Arc::new(FakeBackend::new(buyer, state.clone())),
            buyer_sink.clone(),
        );
        buyer_dispatch
            .propose_meetup(&transaction_id, &proposal())
            .await
            .unwrap();

        {
            let state = state.lock().unwrap();
            assert_eq!(state.transaction.meetup_status, MeetupStatus::Scheduled);
            assert_eq!(state.transaction.meetup_proposed_by, Some(buyer));
        }
        assert_eq!(buyer_sink.conversation_refreshes.load(Ordering::SeqCst), 1);
        assert_eq!(buyer_sink.message_refreshes.load(Ordering::SeqCst), 1);

        // Seller accepts
        let seller_dispatch = ActionDispatcher::new(
            Arc::new(FakeBackend::new(seller, state.clone())),
            Arc::new(CountingSink::default()),
        );
        seller_dispatch.accept_meetup(&transaction_id).await.unwrap();

        assert_eq!(
            state.lock().unwrap().transaction.meetup_status,
            MeetupStatus::Confirmed
        );
    }

    #[tokio::test]
    async fn invalid_proposal_never_reaches_the_backend() {
        let buyer = UserId::new();
        let seller = UserId::new();
        let state = Arc::new(Mutex::new(MarketState::accepted(buyer, seller)));
        let transaction_id = state.lock().unwrap().transaction.id;

        let backend = Arc::new(FakeBackend::new(buyer, state));
        let sink = Arc::new(CountingSink::default());
        let dispatch = ActionDispatcher::new(backend.clone(), sink.clone());

        let stale = MeetupProposal {
            scheduled_meetup_at: Utc::now().checked_sub_days(Days::new(1)).unwrap(),
            ..proposal()
        };
        let error = dispatch
            .propose_meetup(&transaction_id, &stale)
            .await
            .unwrap_err();

        assert!(matches!(error, Error::InvalidInput(_)));
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
        assert_eq!(sink.conversation_refreshes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn server_message_is_surfaced_verbatim() {
        let buyer = UserId::new();
        let seller = UserId::new();
        let state = Arc::new(Mutex::new(MarketState::accepted(buyer, seller)));
        let transaction_id = state.lock().unwrap().transaction.id;
        state.lock().unwrap().transaction.status = TransactionStatus::Cancelled;

        let sink = Arc::new(CountingSink::default());
        let dispatch = ActionDispatcher::new(
            Arc::new(FakeBackend::new(buyer, state)),
            sink.clone(),
        );

        let error = dispatch
            .propose_meetup(&transaction_id, &proposal())
            .await
            .unwrap_err();
        assert_eq!(error.to_string(), "Transaction is not active");
        // No reconciliation on failure
        assert_eq!(sink.conversation_refreshes.load(Ordering::SeqCst), 0);
        assert_eq!(sink.message_refreshes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn transport_failure_gets_a_generic_message() {
        let buyer = UserId::new();
        let seller = UserId::new();
        let state = Arc::new(Mutex::new(MarketState::accepted(buyer, seller)));
        let transaction_id = state.lock().unwrap().transaction.id;

        let backend = Arc::new(FakeBackend::new(seller, state));
        backend.fail_next(Error::Config("connection refused".to_string()));
        let dispatch =
            ActionDispatcher::new(backend, Arc::new(CountingSink::default()));

        let error = dispatch.accept_meetup(&transaction_id).await.unwrap_err();
        assert_eq!(error.to_string(), "Failed to accept meetup");
    }

    #[tokio::test]
    async fn proposer_cannot_accept_their_own_meetup() {
        let buyer = UserId::new();
        let seller = UserId::new();
        let state = Arc::new(Mutex::new(MarketState::accepted(buyer, seller)));
        let transaction_id = state.lock().unwrap().transaction.id;

        let dispatch = ActionDispatcher::new(
            Arc::new(FakeBackend::new(buyer, state.clone())),
            Arc::new(CountingSink::default()),
        );

        dispatch
            .propose_meetup(&transaction_id, &proposal())
            .await
            .unwrap();
        let error = dispatch.accept_meetup(&transaction_id).await.unwrap_err();
        assert_eq!(error.to_string(), "Proposer cannot accept their own meetup");
        assert_eq!(
            state.lock().unwrap().transaction.meetup_status,
            MeetupStatus::Scheduled
        );
    }

    #[tokio::test]
    async fn concurrent_same_action_is_rejected() {
        let buyer = UserId::new();
        let seller = UserId::new();
        let state = Arc::new(Mutex::new(MarketState::accepted(buyer, seller)));
        let transaction_id = state.lock().unwrap().transaction.id;

        let gate = Arc::new(Notify::new());
        let backend = Arc::new(FakeBackend::gated(buyer, state, gate.clone()));
        let dispatch = Arc::new(ActionDispatcher::new(
            backend,
            Arc::new(CountingSink::default()),
        ));

        let first = {
            let dispatch = dispatch.clone();
            tokio::spawn(async move { dispatch.propose_meetup(&transaction_id, &proposal()).await })
        };
        // Let the first call park inside the backend
        sleep(Duration::from_millis(20)).await;

        let error = dispatch
            .propose_meetup(&transaction_id, &proposal())
            .await
            .unwrap_err();
        assert!(matches!(error, Error::ActionPending(_)));

        gate.notify_one();
        first.await.unwrap().unwrap();

        // Slot is released after completion
        gate.notify_one();
        dispatch
            .propose_meetup(&transaction_id, &proposal())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn different_action_kinds_do_not_block_each_other() {
        let buyer = UserId::new();
        let seller = UserId::new();
        let state = Arc::new(Mutex::new(MarketState::accepted(buyer, seller)));
        let transaction_id = state.lock().unwrap().transaction.id;
        let offer_id = state.lock().unwrap().offer.id;

        let gate = Arc::new(Notify::new());
        let backend = Arc::new(FakeBackend::gated(seller, state.clone(), gate.clone()));
        let dispatch = Arc::new(ActionDispatcher::new(
            backend,
            Arc::new(CountingSink::default()),
        ));

        // Schedule a meetup first so accept has something to act on
        {
            let proposer = ActionDispatcher::new(
                Arc::new(FakeBackend::new(buyer, state)),
                Arc::new(CountingSink::default()),
            );
            proposer
                .propose_meetup(&transaction_id, &proposal())
                .await
                .unwrap();
        }

        let accept = {
            let dispatch = dispatch.clone();
            tokio::spawn(async move { dispatch.accept_meetup(&transaction_id).await })
        };
        sleep(Duration::from_millis(20)).await;

        // An offer update while accept is parked is a different action kind
        let second = {
            let dispatch = dispatch.clone();
            tokio::spawn(async move { dispatch.update_offer(&offer_id, "1600.00").await })
        };
        sleep(Duration::from_millis(20)).await;

        gate.notify_one();
        gate.notify_one();
        accept.await.unwrap().unwrap();
        second.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn offer_mutations_reconcile_through_the_sink() {
        let buyer = UserId::new();
        let seller = UserId::new();
        let state = Arc::new(Mutex::new(MarketState::accepted(buyer, seller)));
        state.lock().unwrap().offer.status = OfferStatus::Pending;
        let offer_id = state.lock().unwrap().offer.id;

        let sink = Arc::new(CountingSink::default());
        let dispatch = ActionDispatcher::new(
            Arc::new(FakeBackend::new(seller, state.clone())),
            sink.clone(),
        );

        dispatch.accept_offer(&offer_id).await.unwrap();
        assert_eq!(state.lock().unwrap().offer.status, OfferStatus::Accepted);
        assert_eq!(sink.conversation_refreshes.load(Ordering::SeqCst), 1);
        assert_eq!(sink.message_refreshes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn update_offer_validates_amount_first() {
        let buyer = UserId::new();
        let seller = UserId::new();
        let state = Arc::new(Mutex::new(MarketState::accepted(buyer, seller)));
        let offer_id = state.lock().unwrap().offer.id;

        let backend = Arc::new(FakeBackend::new(buyer, state));
        let dispatch =
            ActionDispatcher::new(backend.clone(), Arc::new(CountingSink::default()));

        let error = dispatch.update_offer(&offer_id, "  ").await.unwrap_err();
        assert!(matches!(error, Error::InvalidInput(_)));
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);

        dispatch.update_offer(&offer_id, "1800.00").await.unwrap();
    }
}
