//! Action-set projection over negotiation state.
//!
//! The server owns every offer and transaction transition; this module
//! only answers "which actions may this viewer take right now". The
//! projection is a pure function of the fetched records and is recomputed
//! on every read rather than cached anywhere.

use tracing::warn;

use crate::models::{MeetupStatus, Offer, OfferStatus, PartyRole, Transaction, UserId};

/// One user-invocable negotiation action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegotiationAction {
    /// Seller accepts a pending offer
    AcceptOffer,
    /// Seller rejects a pending offer
    RejectOffer,
    /// Buyer revises the amount of a pending offer
    UpdateOffer,
    /// Either party proposes a meetup time and place
    ProposeMeetup,
    /// Either party replaces the currently proposed meetup
    UpdateMeetup,
    /// The non-proposing party accepts the proposed meetup
    AcceptMeetup,
    /// Read-only view of a confirmed meetup
    ViewMeetupDetails,
}

impl NegotiationAction {
    /// Human-readable label, matching the button copy of the app
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::AcceptOffer => "Accept offer",
            Self::RejectOffer => "Decline offer",
            Self::UpdateOffer => "Update offer",
            Self::ProposeMeetup => "Set time & location",
            Self::UpdateMeetup => "Update time & location",
            Self::AcceptMeetup => "Accept meetup",
            Self::ViewMeetupDetails => "View details",
        }
    }
}

/// The set of actions currently presentable to a viewer.
///
/// Ordered the way the app renders the buttons. Never stored: callers
/// recompute it from fresh records on every render.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionSet(Vec<NegotiationAction>);

impl ActionSet {
    /// The empty set
    #[must_use]
    pub const fn empty() -> Self {
        Self(Vec::new())
    }

    fn of(actions: &[NegotiationAction]) -> Self {
        Self(actions.to_vec())
    }

    #[must_use]
    pub fn contains(&self, action: NegotiationAction) -> bool {
        self.0.contains(&action)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[NegotiationAction] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = NegotiationAction> + '_ {
        self.0.iter().copied()
    }
}

impl<'a> IntoIterator for &'a ActionSet {
    type Item = NegotiationAction;
    type IntoIter = std::iter::Copied<std::slice::Iter<'a, NegotiationAction>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter().copied()
    }
}

/// A transaction classified by whether it can still advance.
///
/// Makes the projector's branching exhaustive instead of a nest of
/// `Option` and status checks.
#[derive(Debug, Clone, Copy)]
pub enum TransactionPhase<'a> {
    /// No transaction accompanies the offer
    Missing,
    /// The transaction is active and the meetup can still change
    Active(&'a Transaction),
    /// The transaction was cancelled or completed
    Terminal(&'a Transaction),
}

impl<'a> TransactionPhase<'a> {
    #[must_use]
    pub fn classify(transaction: Option<&'a Transaction>) -> Self {
        match transaction {
            None => Self::Missing,
            Some(t) if t.status.is_active() => Self::Active(t),
            Some(t) => Self::Terminal(t),
        }
    }
}

/// Compute the actions `viewer` may take given the current records.
///
/// Pure and deterministic; safe to call on every render. Combinations
/// that should not occur (an accepted offer with no active transaction, a
/// viewer who is not a party) degrade to an empty set with a diagnostic
/// log, never a panic.
#[must_use]
pub fn project_actions(
    offer: Option<&Offer>,
    transaction: Option<&Transaction>,
    viewer: &UserId,
) -> ActionSet {
    let Some(offer) = offer else {
        return ActionSet::empty();
    };

    match offer.status {
        OfferStatus::Pending => project_pending(offer, viewer),
        OfferStatus::Accepted => project_accepted(offer, transaction, viewer),
        // Terminal, non-accepted offers carry status display only
        OfferStatus::Rejected | OfferStatus::Expired | OfferStatus::Withdrawn => {
            ActionSet::empty()
        }
    }
}

fn project_pending(offer: &Offer, viewer: &UserId) -> ActionSet {
    match offer.role_of(viewer) {
        Some(PartyRole::Seller) => ActionSet::of(&[
            NegotiationAction::AcceptOffer,
            NegotiationAction::RejectOffer,
        ]),
        Some(PartyRole::Buyer) => ActionSet::of(&[NegotiationAction::UpdateOffer]),
        None => {
            warn!(offer = %offer.id, viewer = %viewer, "viewer is not a party to this offer");
            ActionSet::empty()
        }
    }
}

fn project_accepted(
    offer: &Offer,
    transaction: Option<&Transaction>,
    viewer: &UserId,
) -> ActionSet {
    let transaction = match TransactionPhase::classify(transaction) {
        TransactionPhase::Active(transaction) => transaction,
        TransactionPhase::Missing => {
            warn!(offer = %offer.id, "accepted offer has no transaction record");
            return ActionSet::empty();
        }
        TransactionPhase::Terminal(transaction) => {
            warn!(
                transaction = %transaction.id,
                status = ?transaction.status,
                "transaction is no longer active"
            );
            return ActionSet::empty();
        }
    };

    if !transaction.is_party(viewer) {
        warn!(transaction = %transaction.id, viewer = %viewer, "viewer is not a party to this transaction");
        return ActionSet::empty();
    }

    match transaction.meetup_status {
        MeetupStatus::NotScheduled => ActionSet::of(&[NegotiationAction::ProposeMeetup]),
        MeetupStatus::Scheduled => match transaction.meetup_proposed_by {
            // The proposer waits for the other party; they may only revise
            Some(proposer) if proposer == *viewer => {
                ActionSet::of(&[NegotiationAction::UpdateMeetup])
            }
            Some(_) => ActionSet::of(&[
                NegotiationAction::UpdateMeetup,
                NegotiationAction::AcceptMeetup,
            ]),
            // Legacy records predate the proposer field; both parties get
            // the full row and the server arbitrates acceptance
            None => ActionSet::of(&[
                NegotiationAction::UpdateMeetup,
                NegotiationAction::AcceptMeetup,
            ]),
        },
        MeetupStatus::Confirmed => ActionSet::of(&[NegotiationAction::ViewMeetupDetails]),
    }
}
