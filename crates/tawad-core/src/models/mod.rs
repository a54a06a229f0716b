//! Wire models for the marketplace API
//!
//! All records here are authoritative server state; the client never
//! mutates them locally, it only requests mutations and refetches.

pub mod conversation;
pub mod offer;
pub mod transaction;
pub mod user;

pub use conversation::{
    ConversationId, ConversationView, Message, MessageId, MessageType, ProductSummary,
};
pub use offer::{validate_amount, Offer, OfferId, OfferStatus, PartyRole};
pub use transaction::{
    MeetupPoint, MeetupProposal, MeetupStatus, Transaction, TransactionId, TransactionStatus,
};
pub use user::{UserId, UserProfile};
