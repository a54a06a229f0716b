//! Transaction records and meetup scheduling types

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::user::UserId;

/// A unique identifier for a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransactionId(Uuid);

impl TransactionId {
    /// Create a new unique transaction ID (used by tests and in-memory fakes)
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Get the string representation of this ID
    #[must_use]
    pub fn as_str(&self) -> String {
        self.0.to_string()
    }
}

impl Default for TransactionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TransactionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Lifecycle status of a transaction. Cancellation and completion happen
/// server-side; the client only ever observes them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    Active,
    Completed,
    Cancelled,
}

impl TransactionStatus {
    /// Whether the transaction can still advance
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Active)
    }
}

/// Sub-state of the in-person exchange arrangement.
///
/// Progresses `NotScheduled` -> `Scheduled` -> `Confirmed`, server-side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeetupStatus {
    NotScheduled,
    Scheduled,
    Confirmed,
}

/// A geographic point with its display address
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeetupPoint {
    pub lat: f64,
    pub lng: f64,
    pub address: String,
}

/// Post-acceptance record tracking the meetup arrangement between buyer
/// and seller. Exists only for conversations whose offer was accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: TransactionId,
    pub status: TransactionStatus,
    pub meetup_status: MeetupStatus,
    #[serde(default)]
    pub scheduled_meetup_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub meetup_location: Option<String>,
    #[serde(default)]
    pub meetup_coordinates: Option<MeetupPoint>,
    /// The user who most recently proposed the meetup. `None` on legacy
    /// records that predate the field.
    #[serde(default)]
    pub meetup_proposed_by: Option<UserId>,
    /// Agreed decimal price as the wire carries it
    pub agreed_price: String,
    pub buyer_id: UserId,
    pub seller_id: UserId,
}

impl Transaction {
    /// Whether `user` is buyer or seller on this transaction
    #[must_use]
    pub fn is_party(&self, user: &UserId) -> bool {
        *user == self.buyer_id || *user == self.seller_id
    }

    /// Scheduled time and location, when both halves are present.
    ///
    /// The API sets both fields together; a record carrying only one is
    /// treated as unscheduled rather than trusted.
    #[must_use]
    pub fn meetup_details(&self) -> Option<(DateTime<Utc>, &str)> {
        match (self.scheduled_meetup_at, self.meetup_location.as_deref()) {
            (Some(at), Some(location)) => Some((at, location)),
            _ => None,
        }
    }
}

/// A meetup date/time/location chosen by one party, sent to the
/// propose-meetup endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeetupProposal {
    pub scheduled_meetup_at: DateTime<Utc>,
    pub meetup_location: String,
    pub meetup_coordinates: MeetupPoint,
}

impl MeetupProposal {
    /// Client-side guard run before dispatch. The server re-validates;
    /// failing here just saves a round trip.
    pub fn validate(&self, now: DateTime<Utc>) -> Result<()> {
        if self.scheduled_meetup_at <= now {
            return Err(Error::InvalidInput(
                "meetup time must be in the future".to_string(),
            ));
        }
        if self.meetup_location.trim().is_empty() {
            return Err(Error::InvalidInput(
                "meetup location is required".to_string(),
            ));
        }
        if self.meetup_coordinates.address.trim().is_empty() {
            return Err(Error::InvalidInput(
                "meetup coordinates must include an address".to_string(),
            ));
        }
        Ok(())
    }
}
