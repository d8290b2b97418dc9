//! Dialer notification payloads

use crate::domain::agent::{agent_topic, Agent};
use crate::domain::campaign::entity::{campaign_topic, Campaign};
use crate::domain::contact::Contact;
use crate::domain::shared::events::DomainEvent;
use crate::domain::shared::value_objects::{AgentId, CallId, CampaignId, ContactId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Global topic for dialer-wide activity
pub const PREDICTIVE_DIALING_TOPIC: &str = "predictive-dialing";

/// A scheduler run placed calls for a campaign
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialingStarted {
    pub campaign_id: CampaignId,
    pub campaign_name: String,
    pub calls_initiated: usize,
    pub timestamp: DateTime<Utc>,
}

impl DialingStarted {
    pub fn new(campaign: &Campaign, calls_initiated: usize) -> Self {
        Self {
            campaign_id: campaign.id,
            campaign_name: campaign.name.clone(),
            calls_initiated,
            timestamp: Utc::now(),
        }
    }
}

impl DomainEvent for DialingStarted {
    fn event_type(&self) -> &'static str {
        "dialing.started"
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        self.timestamp
    }

    fn topics(&self) -> Vec<String> {
        vec![
            campaign_topic(&self.campaign_id),
            PREDICTIVE_DIALING_TOPIC.to_string(),
        ]
    }
}

/// Contact snapshot sent to the agent screen
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutedContact {
    pub id: ContactId,
    pub name: String,
    pub phone: String,
    pub outstanding_balance: Option<f64>,
    pub penalty: Option<f64>,
    pub extra: Map<String, Value>,
}

impl From<&Contact> for RoutedContact {
    fn from(contact: &Contact) -> Self {
        Self {
            id: contact.id,
            name: contact.name.clone(),
            phone: contact.phone.to_string(),
            outstanding_balance: contact.outstanding_balance,
            penalty: contact.penalty,
            extra: contact.extra.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutedAgent {
    pub id: AgentId,
    pub name: String,
    pub extension: String,
}

impl From<&Agent> for RoutedAgent {
    fn from(agent: &Agent) -> Self {
        Self {
            id: agent.id,
            name: agent.name.clone(),
            extension: agent.extension.clone(),
        }
    }
}

/// An answered call was bridged to an agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallRouted {
    pub call_id: CallId,
    pub campaign_id: CampaignId,
    pub contact: RoutedContact,
    pub agent: RoutedAgent,
    pub timestamp: DateTime<Utc>,
}

impl CallRouted {
    pub fn new(call_id: CallId, campaign_id: CampaignId, contact: &Contact, agent: &Agent) -> Self {
        Self {
            call_id,
            campaign_id,
            contact: contact.into(),
            agent: agent.into(),
            timestamp: Utc::now(),
        }
    }
}

impl DomainEvent for CallRouted {
    fn event_type(&self) -> &'static str {
        "call.routed"
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        self.timestamp
    }

    fn topics(&self) -> Vec<String> {
        vec![agent_topic(&self.agent.id), campaign_topic(&self.campaign_id)]
    }
}
