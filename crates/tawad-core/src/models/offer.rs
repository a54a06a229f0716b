//! Offer records and status classification

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::user::UserId;

/// A unique identifier for an offer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OfferId(Uuid);

impl OfferId {
    /// Create a new unique offer ID (used by tests and in-memory fakes)
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

impl Default for OfferId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for OfferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for OfferId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Lifecycle status of a price offer.
///
/// Transitions happen server-side only and are monotonic: once an offer
/// leaves `Pending` it never returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OfferStatus {
    Pending,
    Accepted,
    Rejected,
    Expired,
    Withdrawn,
}

impl OfferStatus {
    /// Whether this status admits no further transitions
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// Which side of a negotiation a user is on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartyRole {
    Buyer,
    Seller,
}

/// A price offer on a product, as returned by the offers endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Offer {
    pub id: OfferId,
    /// Decimal amount as the wire carries it, e.g. `"1500.00"`
    pub amount: String,
    pub status: OfferStatus,
    pub buyer_id: UserId,
    pub seller_id: UserId,
}

impl Offer {
    /// Classify `user` as buyer or seller of this offer, if either
    #[must_use]
    pub fn role_of(&self, user: &UserId) -> Option<PartyRole> {
        if *user == self.buyer_id {
            Some(PartyRole::Buyer)
        } else if *user == self.seller_id {
            Some(PartyRole::Seller)
        } else {
            None
        }
    }
}

/// Validate a decimal amount string before it is sent to the server.
///
/// The wire keeps amounts as strings; this only guards against blank or
/// non-positive values, the server owns the real validation.
pub fn validate_amount(raw: &str) -> Result<()> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidInput("offer amount is required".to_string()));
    }
    match trimmed.parse::<f64>() {
        Ok(value) if value > 0.0 && value.is_finite() => Ok(()),
        _ => Err(Error::InvalidInput(format!("invalid offer amount: {raw}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offer(status: OfferStatus) -> Offer {
        Offer {
            id: OfferId::new(),
            amount: "1500.00".to_string(),
            status,
            buyer_id: UserId::new(),
            seller_id: UserId::new(),
        }
    }

    #[test]
    fn test_status_terminality() {
        assert!(!OfferStatus::Pending.is_terminal());
        assert!(OfferStatus::Accepted.is_terminal());
        assert!(OfferStatus::Rejected.is_terminal());
        assert!(OfferStatus::Expired.is_terminal());
        assert!(OfferStatus::Withdrawn.is_terminal());
    }

    #[test]
    fn test_status_wire_names() {
        let status: OfferStatus = serde_json::from_str(r#""pending""#).unwrap();
        assert_eq!(status, OfferStatus::Pending);
        assert_eq!(
            serde_json::to_string(&OfferStatus::Withdrawn).unwrap(),
            r#""withdrawn""#
        );
    }

    #[test]
    fn test_role_of() {
        let offer = offer(OfferStatus::Pending);
        assert_eq!(offer.role_of(&offer.buyer_id), Some(PartyRole::Buyer));
        assert_eq!(offer.role_of(&offer.seller_id), Some(PartyRole::Seller));
        assert_eq!(offer.role_of(&UserId::new()), None);
    }

    #[test]
    fn test_offer_parses_camel_case() {
        let offer: Offer = serde_json::from_str(
            r#"{
                "id": "018f2e1a-0000-7000-8000-000000000010",
                "amount": "950.50",
                "status": "accepted",
                "buyerId": "018f2e1a-0000-7000-8000-000000000001",
                "sellerId": "018f2e1a-0000-7000-8000-000000000002"
            }"#,
        )
        .unwrap();
        assert_eq!(offer.amount, "950.50");
        assert_eq!(offer.status, OfferStatus::Accepted);
    }

    #[test]
    fn test_validate_amount() {
        assert!(validate_amount("1500").is_ok());
        assert!(validate_amount(" 99.99 ").is_ok());
        assert!(validate_amount("").is_err());
        assert!(validate_amount("   ").is_err());
        assert!(validate_amount("0").is_err());
        assert!(validate_amount("-5").is_err());
        assert!(validate_amount("abc").is_err());
    }
}
