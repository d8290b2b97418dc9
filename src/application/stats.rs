//! Campaign dialing statistics

use crate::domain::agent::AgentPool;
use crate::domain::call::CallRepository;
use crate::domain::contact::ContactLedger;
use crate::domain::shared::result::Result;
use crate::domain::shared::value_objects::CampaignId;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Point-in-time counters for one campaign
///
/// Agent counts are process-wide, not per campaign.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialingStats {
    pub total_contacts: u64,
    pub dialed_contacts: u64,
    /// dialing, ringing or connected
    pub active_calls: u64,
    /// busy, no_answer, failed or no_agent_available
    pub completed_calls: u64,
    pub idle_agents: u64,
    pub busy_agents: u64,
}

impl DialingStats {
    pub fn remaining_contacts(&self) -> u64 {
        self.total_contacts.saturating_sub(self.dialed_contacts)
    }
}

pub struct StatsAggregator {
    contacts: Arc<ContactLedger>,
    calls: Arc<dyn CallRepository>,
    agents: Arc<AgentPool>,
}

impl StatsAggregator {
    pub fn new(contacts: Arc<ContactLedger>, calls: Arc<dyn CallRepository>, agents: Arc<AgentPool>) -> Self {
        Self {
            contacts,
            calls,
            agents,
        }
    }

    pub async fn snapshot(&self, campaign_id: &CampaignId) -> Result<DialingStats> {
        let counts = self.contacts.counts(campaign_id).await?;
        let by_status = self.calls.status_counts(campaign_id).await?;

        let active_calls = by_status
            .iter()
            .filter(|c| c.status.is_active())
            .map(|c| c.count)
            .sum();
        let completed_calls = by_status
            .iter()
            .filter(|c| c.status.is_completed())
            .map(|c| c.count)
            .sum();

        Ok(DialingStats {
            total_contacts: counts.total,
            dialed_contacts: counts.dialed,
            active_calls,
            completed_calls,
            idle_agents: self.agents.count_idle().await? as u64,
            busy_agents: self.agents.count_busy().await? as u64,
        })
    }
}
