//! Call aggregate root

use crate::domain::call::value_object::{CallStatus, DialOutcome};
use crate::domain::shared::error::DomainError;
use crate::domain::shared::result::Result;
use crate::domain::shared::value_objects::{AgentId, CallId, CallerIdId, CampaignId, ContactId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Call aggregate root
///
/// One record per dial attempt. `agent_id` is set exactly while the call is
/// `connected`, and nothing changes once a terminal status is reached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Call {
    id: CallId,
    campaign_id: CampaignId,
    contact_id: ContactId,
    caller_id: CallerIdId,
    agent_id: Option<AgentId>,
    status: CallStatus,
    started_at: DateTime<Utc>,
    ended_at: Option<DateTime<Utc>>,
}

impl Call {
    /// New attempt, already handed to the dialer
    pub fn dial(campaign_id: CampaignId, contact_id: ContactId, caller_id: CallerIdId) -> Self {
        Self {
            id: CallId::new(),
            campaign_id,
            contact_id,
            caller_id,
            agent_id: None,
            status: CallStatus::Dialing,
            started_at: Utc::now(),
            ended_at: None,
        }
    }

    /// Rebuild a call from storage
    #[allow(clippy::too_many_arguments)]
    pub fn restore(
        id: CallId,
        campaign_id: CampaignId,
        contact_id: ContactId,
        caller_id: CallerIdId,
        agent_id: Option<AgentId>,
        status: CallStatus,
        started_at: DateTime<Utc>,
        ended_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id,
            campaign_id,
            contact_id,
            caller_id,
            agent_id,
            status,
            started_at,
            ended_at,
        }
    }

    /// Callee picked up; an agent is needed next
    pub fn ring(&mut self) -> Result<()> {
        self.transition_to(CallStatus::Ringing)
    }

    /// Bridge the answered call to an agent
    pub fn connect(&mut self, agent_id: AgentId) -> Result<()> {
        self.transition_to(CallStatus::Connected)?;
        self.agent_id = Some(agent_id);
        Ok(())
    }

    /// Answered call dropped because every agent was busy
    pub fn abandon_without_agent(&mut self) -> Result<()> {
        self.transition_to(CallStatus::NoAgentAvailable)?;
        self.ended_at = Some(Utc::now());
        Ok(())
    }

    /// End the call with a non-answered outcome
    pub fn finish(&mut self, outcome: DialOutcome) -> Result<()> {
        let status = outcome.terminal_status().ok_or_else(|| {
            DomainError::InvalidStateTransition(format!(
                "Outcome {} does not end call {}",
                outcome, self.id
            ))
        })?;

        self.transition_to(status)?;
        self.ended_at = Some(Utc::now());
        Ok(())
    }

    pub fn cancel(&mut self) -> Result<()> {
        self.transition_to(CallStatus::Cancelled)?;
        self.ended_at = Some(Utc::now());
        Ok(())
    }

    fn transition_to(&mut self, new_status: CallStatus) -> Result<()> {
        if !self.status.can_transition_to(new_status) {
            return Err(DomainError::InvalidStateTransition(format!(
                "Cannot transition call {} from {} to {}",
                self.id, self.status, new_status
            )));
        }

        self.status = new_status;
        Ok(())
    }

    // Getters
    pub fn id(&self) -> &CallId {
        &self.id
    }

    pub fn campaign_id(&self) -> &CampaignId {
        &self.campaign_id
    }

    pub fn contact_id(&self) -> &ContactId {
        &self.contact_id
    }

    pub fn caller_id(&self) -> &CallerIdId {
        &self.caller_id
    }

    pub fn agent_id(&self) -> Option<&AgentId> {
        self.agent_id.as_ref()
    }

    pub fn status(&self) -> CallStatus {
        self.status
    }

    pub fn started_at(&self) -> &DateTime<Utc> {
        &self.started_at
    }

    pub fn ended_at(&self) -> Option<&DateTime<Utc>> {
        self.ended_at.as_ref()
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}
