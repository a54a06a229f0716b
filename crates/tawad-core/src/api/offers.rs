//! Offer endpoints.
//!
//! Each mutation returns the updated [`Offer`] record; the client still
//! refetches the conversation afterwards rather than trusting the
//! returned snapshot alone.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;

use crate::api::ApiClient;
use crate::error::Result;
use crate::models::{Offer, OfferId};

/// Body for creating an offer on a product
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOffer {
    pub product_id: String,
    /// Decimal amount as a string, e.g. `"1500.00"`
    pub offer_amount: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl ApiClient {
    /// Create an offer on a product
    pub async fn create_offer(&self, offer: &CreateOffer) -> Result<Offer> {
        let response = self
            .send(self.http().post(self.url("/offers")).json(offer))
            .await?;
        Ok(response.json::<Offer>().await?)
    }

    /// Accept a pending offer (seller only, enforced server-side)
    pub async fn accept_offer(&self, id: &OfferId) -> Result<Offer> {
        let response = self
            .send(self.http().put(self.url(&format!("/offers/{id}/accept"))))
            .await?;
        Ok(response.json::<Offer>().await?)
    }

    /// Reject a pending offer (seller only, enforced server-side)
    pub async fn reject_offer(&self, id: &OfferId) -> Result<Offer> {
        let response = self
            .send(self.http().put(self.url(&format!("/offers/{id}/reject"))))
            .await?;
        Ok(response.json::<Offer>().await?)
    }

    /// Revise the amount of a pending offer (buyer only, enforced
    /// server-side)
    pub async fn update_offer(&self, id: &OfferId, new_amount: &str) -> Result<Offer> {
        let response = self
            .send(
                self.http()
                    .put(self.url(&format!("/offers/{id}/update")))
                    .json(&json!({ "newAmount": new_amount })),
            )
            .await?;
        Ok(response.json::<Offer>().await?)
    }
}
