//! Contact entity

use crate::domain::shared::value_objects::{CampaignId, ContactId, PhoneNumber};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A debtor/customer to be called on behalf of a campaign
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub id: ContactId,
    pub campaign_id: CampaignId,
    pub name: String,
    pub phone: PhoneNumber,
    pub outstanding_balance: Option<f64>,
    pub penalty: Option<f64>,
    /// Opaque profile data from the import, passed through untouched
    pub extra: Map<String, Value>,
    pub was_dialed: bool,
}

impl Contact {
    pub fn new(campaign_id: CampaignId, name: impl Into<String>, phone: PhoneNumber) -> Self {
        Self {
            id: ContactId::new(),
            campaign_id,
            name: name.into(),
            phone,
            outstanding_balance: None,
            penalty: None,
            extra: Map::new(),
            was_dialed: false,
        }
    }

    pub fn with_balance(mut self, outstanding: f64, penalty: f64) -> Self {
        self.outstanding_balance = Some(outstanding);
        self.penalty = Some(penalty);
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }
}
