//! Transaction meetup endpoints.
//!
//! Both mutations return success or an error payload; the updated
//! transaction is picked up by the conversation refetch.

use crate::api::ApiClient;
use crate::error::Result;
use crate::models::{MeetupProposal, TransactionId};

impl ApiClient {
    /// Propose (or replace) the meetup time and place for a transaction
    pub async fn propose_meetup(
        &self,
        id: &TransactionId,
        proposal: &MeetupProposal,
    ) -> Result<()> {
        self.send(
            self.http()
                .post(self.url(&format!("/transactions/{id}/propose-meetup")))
                .json(proposal),
        )
        .await?;
        Ok(())
    }

    /// Accept the currently proposed meetup for a transaction
    pub async fn accept_meetup(&self, id: &TransactionId) -> Result<()> {
        self.send(
            self.http()
                .post(self.url(&format!("/transactions/{id}/accept-meetup"))),
        )
        .await?;
        Ok(())
    }
}
