//! Campaign entity

use crate::domain::shared::value_objects::CampaignId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An outbound calling effort with its own contact list
///
/// Campaigns are created and imported elsewhere; the dialer only reads them
/// and honours `is_active`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Campaign {
    pub id: CampaignId,
    pub name: String,
    pub product_type: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Campaign {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: CampaignId::new(),
            name: name.into(),
            product_type: None,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    pub fn with_product_type(mut self, product_type: impl Into<String>) -> Self {
        self.product_type = Some(product_type.into());
        self
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }

    /// Topic carrying every event of this campaign
    pub fn topic(&self) -> String {
        campaign_topic(&self.id)
    }
}

pub fn campaign_topic(id: &CampaignId) -> String {
    format!("campaign.{}", id)
}
