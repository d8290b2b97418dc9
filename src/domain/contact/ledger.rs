//! Contact ledger - which contacts of a campaign have been dialed

use super::entity::Contact;
use super::repository::{ContactCounts, ContactRepository};
use crate::domain::shared::result::Result;
use crate::domain::shared::value_objects::{CampaignId, ContactId};
use std::sync::Arc;
use tracing::{debug, warn};

pub struct ContactLedger {
    repository: Arc<dyn ContactRepository>,
}

impl ContactLedger {
    pub fn new(repository: Arc<dyn ContactRepository>) -> Self {
        Self { repository }
    }

    /// Claim up to `n` contacts that were never dialed
    ///
    /// Concurrent claims for the same campaign get disjoint sets. An empty
    /// result means the campaign is exhausted, not an error.
    pub async fn claim_batch(&self, campaign_id: &CampaignId, n: usize) -> Result<Vec<Contact>> {
        if n == 0 {
            return Ok(Vec::new());
        }

        let contacts = self.repository.claim_undialed(campaign_id, n).await?;
        debug!(
            campaign_id = %campaign_id,
            requested = n,
            claimed = contacts.len(),
            "Contacts claimed"
        );

        Ok(contacts)
    }

    /// Give back a claimed contact whose call could not be created
    pub async fn release(&self, contact_id: &ContactId) -> Result<bool> {
        let released = self.repository.release_claim(contact_id).await?;
        if !released {
            warn!(contact_id = %contact_id, "Contact claim was not released");
        }
        Ok(released)
    }

    /// Release several claims, continuing past individual failures
    ///
    /// Returns how many were released.
    pub async fn release_all(&self, contact_ids: &[ContactId]) -> usize {
        let mut released = 0;
        for id in contact_ids {
            match self.repository.release_claim(id).await {
                Ok(true) => released += 1,
                Ok(false) => warn!(contact_id = %id, "Contact claim was not released"),
                Err(e) => warn!(contact_id = %id, error = %e, "Failed to release contact claim"),
            }
        }
        released
    }

    pub async fn counts(&self, campaign_id: &CampaignId) -> Result<ContactCounts> {
        self.repository.counts(campaign_id).await
    }
}
