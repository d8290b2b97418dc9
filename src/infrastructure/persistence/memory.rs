//! In-memory dialer store
//!
//! Implements every repository port over a single `RwLock`. Each atomic
//! operation (contact claim, agent claim, compare-and-set) runs inside one
//! write-lock section, so concurrent schedulers and outcome reports are
//! linearized.

use crate::domain::agent::{Agent, AgentRepository, AgentStatus};
use crate::domain::call::{Call, CallRepository, CallStatus, CallStatusCount};
use crate::domain::caller_id::{CallerId, CallerIdRepository};
use crate::domain::campaign::{Campaign, CampaignRepository};
use crate::domain::contact::repository::ContactCounts;
use crate::domain::contact::{Contact, ContactRepository};
use crate::domain::shared::error::DomainError;
use crate::domain::shared::result::Result;
use crate::domain::shared::value_objects::{AgentId, CallId, CampaignId, ContactId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Default)]
struct StoreState {
    campaigns: Vec<Campaign>,
    /// Insertion order is the claim order
    contacts: Vec<Contact>,
    agents: Vec<Agent>,
    caller_ids: Vec<CallerId>,
    calls: Vec<Call>,
    call_index: HashMap<CallId, usize>,
}

#[derive(Default)]
pub struct InMemoryDialerStore {
    state: RwLock<StoreState>,
}

impl InMemoryDialerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_campaign(&self, campaign: Campaign) {
        let mut state = self.state.write().await;
        state.campaigns.retain(|c| c.id != campaign.id);
        state.campaigns.push(campaign);
    }

    pub async fn set_campaign_active(&self, id: &CampaignId, active: bool) -> Result<()> {
        let mut state = self.state.write().await;
        let campaign = state
            .campaigns
            .iter_mut()
            .find(|c| c.id == *id)
            .ok_or_else(|| DomainError::NotFound(format!("Campaign {}", id)))?;
        campaign.is_active = active;
        Ok(())
    }

    pub async fn insert_contacts(&self, contacts: impl IntoIterator<Item = Contact>) {
        let mut state = self.state.write().await;
        state.contacts.extend(contacts);
    }

    pub async fn insert_agent(&self, agent: Agent) {
        let mut state = self.state.write().await;
        state.agents.push(agent);
    }

    pub async fn insert_caller_id(&self, caller_id: CallerId) {
        let mut state = self.state.write().await;
        state.caller_ids.push(caller_id);
    }

    pub async fn set_caller_id_active(&self, number: &str, active: bool) {
        let mut state = self.state.write().await;
        for caller_id in state.caller_ids.iter_mut().filter(|c| c.number == number) {
            caller_id.is_active = active;
        }
    }

    pub async fn agents(&self) -> Vec<Agent> {
        self.state.read().await.agents.clone()
    }

    pub async fn contacts(&self, campaign_id: &CampaignId) -> Vec<Contact> {
        self.state
            .read()
            .await
            .contacts
            .iter()
            .filter(|c| c.campaign_id == *campaign_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl CampaignRepository for InMemoryDialerStore {
    async fn find_by_id(&self, id: &CampaignId) -> Result<Option<Campaign>> {
        let state = self.state.read().await;
        Ok(state.campaigns.iter().find(|c| c.id == *id).cloned())
    }

    async fn list_active(&self) -> Result<Vec<Campaign>> {
        let state = self.state.read().await;
        Ok(state.campaigns.iter().filter(|c| c.is_active).cloned().collect())
    }
}

#[async_trait]
impl AgentRepository for InMemoryDialerStore {
    async fn count_by_status(&self, status: AgentStatus) -> Result<u64> {
        let state = self.state.read().await;
        Ok(state.agents.iter().filter(|a| a.status == status).count() as u64)
    }

    async fn claim_idle(&self, selection_key: u64) -> Result<Option<Agent>> {
        let mut state = self.state.write().await;

        let idle: Vec<usize> = state
            .agents
            .iter()
            .enumerate()
            .filter(|(_, a)| a.is_idle())
            .map(|(i, _)| i)
            .collect();

        if idle.is_empty() {
            return Ok(None);
        }

        let index = idle[(selection_key % idle.len() as u64) as usize];
        let agent = &mut state.agents[index];
        agent.status = AgentStatus::Busy;
        debug!(agent_id = %agent.id, "Agent marked busy");

        Ok(Some(agent.clone()))
    }

    async fn release(&self, id: &AgentId) -> Result<bool> {
        let mut state = self.state.write().await;
        let agent = state
            .agents
            .iter_mut()
            .find(|a| a.id == *id)
            .ok_or_else(|| DomainError::NotFound(format!("Agent {}", id)))?;

        if agent.status == AgentStatus::Idle {
            return Ok(false);
        }

        agent.status = AgentStatus::Idle;
        Ok(true)
    }

    async fn find_by_id(&self, id: &AgentId) -> Result<Option<Agent>> {
        let state = self.state.read().await;
        Ok(state.agents.iter().find(|a| a.id == *id).cloned())
    }
}

#[async_trait]
impl ContactRepository for InMemoryDialerStore {
    async fn claim_undialed(&self, campaign_id: &CampaignId, limit: usize) -> Result<Vec<Contact>> {
        let mut state = self.state.write().await;

        let claimed: Vec<Contact> = state
            .contacts
            .iter_mut()
            .filter(|c| c.campaign_id == *campaign_id && !c.was_dialed)
            .take(limit)
            .map(|c| {
                c.was_dialed = true;
                c.clone()
            })
            .collect();

        Ok(claimed)
    }

    async fn release_claim(&self, id: &ContactId) -> Result<bool> {
        let mut state = self.state.write().await;

        if state.calls.iter().any(|call| call.contact_id() == id) {
            return Ok(false);
        }

        match state.contacts.iter_mut().find(|c| c.id == *id) {
            Some(contact) if contact.was_dialed => {
                contact.was_dialed = false;
                Ok(true)
            }
            Some(_) => Ok(false),
            None => Err(DomainError::NotFound(format!("Contact {}", id))),
        }
    }

    async fn counts(&self, campaign_id: &CampaignId) -> Result<ContactCounts> {
        let state = self.state.read().await;
        let mut counts = ContactCounts::default();
        for contact in state.contacts.iter().filter(|c| c.campaign_id == *campaign_id) {
            counts.total += 1;
            if contact.was_dialed {
                counts.dialed += 1;
            }
        }
        Ok(counts)
    }

    async fn find_by_id(&self, id: &ContactId) -> Result<Option<Contact>> {
        let state = self.state.read().await;
        Ok(state.contacts.iter().find(|c| c.id == *id).cloned())
    }
}

#[async_trait]
impl CallerIdRepository for InMemoryDialerStore {
    async fn list_active(&self) -> Result<Vec<CallerId>> {
        let state = self.state.read().await;
        Ok(state.caller_ids.iter().filter(|c| c.is_active).cloned().collect())
    }
}

#[async_trait]
impl CallRepository for InMemoryDialerStore {
    async fn create(&self, call: &Call) -> Result<()> {
        let mut state = self.state.write().await;

        if state.call_index.contains_key(call.id()) {
            return Err(DomainError::Conflict(format!("Call {} already exists", call.id())));
        }

        let position = state.calls.len();
        state.call_index.insert(*call.id(), position);
        state.calls.push(call.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &CallId) -> Result<Option<Call>> {
        let state = self.state.read().await;
        Ok(state.call_index.get(id).map(|&i| state.calls[i].clone()))
    }

    async fn save_transition(&self, call: &Call, expected: CallStatus) -> Result<bool> {
        let mut state = self.state.write().await;
        let position = *state
            .call_index
            .get(call.id())
            .ok_or_else(|| DomainError::NotFound(format!("Call {}", call.id())))?;

        let stored = &mut state.calls[position];
        if stored.status() != expected {
            return Ok(false);
        }

        *stored = call.clone();
        Ok(true)
    }

    async fn cancel_dialing(&self, campaign_id: &CampaignId, ended_at: DateTime<Utc>) -> Result<u64> {
        let mut state = self.state.write().await;
        let mut cancelled = 0;

        for call in state
            .calls
            .iter_mut()
            .filter(|c| c.campaign_id() == campaign_id && c.status() == CallStatus::Dialing)
        {
            *call = Call::restore(
                *call.id(),
                *call.campaign_id(),
                *call.contact_id(),
                *call.caller_id(),
                None,
                CallStatus::Cancelled,
                *call.started_at(),
                Some(ended_at),
            );
            cancelled += 1;
        }

        Ok(cancelled)
    }

    async fn status_counts(&self, campaign_id: &CampaignId) -> Result<Vec<CallStatusCount>> {
        let state = self.state.read().await;
        let mut counts: HashMap<CallStatus, u64> = HashMap::new();

        for call in state.calls.iter().filter(|c| c.campaign_id() == campaign_id) {
            *counts.entry(call.status()).or_default() += 1;
        }

        Ok(CallStatus::ALL
            .into_iter()
            .filter_map(|status| {
                counts
                    .get(&status)
                    .map(|&count| CallStatusCount { status, count })
            })
            .collect())
    }

    async fn list_by_campaign(&self, campaign_id: &CampaignId) -> Result<Vec<Call>> {
        let state = self.state.read().await;
        Ok(state
            .calls
            .iter()
            .filter(|c| c.campaign_id() == campaign_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::caller_id::CallerId;
    use crate::domain::shared::value_objects::{CallerIdId, PhoneNumber};
    use std::collections::HashSet;
    use std::sync::Arc;

    fn contact(campaign: &CampaignId, i: usize) -> Contact {
        Contact::new(
            *campaign,
            format!("Contact {}", i),
            PhoneNumber::parse(&format!("0812000{:04}", i)).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_claim_undialed_in_insertion_order() {
        let store = InMemoryDialerStore::new();
        let campaign = CampaignId::new();
        let contacts: Vec<Contact> = (0..5).map(|i| contact(&campaign, i)).collect();
        let expected: Vec<ContactId> = contacts.iter().map(|c| c.id).collect();
        store.insert_contacts(contacts).await;

        let first = store.claim_undialed(&campaign, 3).await.unwrap();
        let second = store.claim_undialed(&campaign, 3).await.unwrap();
        let third = store.claim_undialed(&campaign, 3).await.unwrap();

        assert_eq!(first.iter().map(|c| c.id).collect::<Vec<_>>(), expected[..3]);
        assert_eq!(second.iter().map(|c| c.id).collect::<Vec<_>>(), expected[3..]);
        assert!(third.is_empty());
        assert!(first.iter().all(|c| c.was_dialed));
    }

    #[tokio::test]
    async fn test_claim_is_scoped_to_campaign() {
        let store = InMemoryDialerStore::new();
        let a = CampaignId::new();
        let b = CampaignId::new();
        store.insert_contacts(vec![contact(&a, 1), contact(&b, 2)]).await;

        let claimed = store.claim_undialed(&a, 10).await.unwrap();
        assert_eq!(claimed.len(), 1);
        assert_eq!(claimed[0].campaign_id, a);
        assert_eq!(store.counts(&b).await.unwrap(), ContactCounts { total: 1, dialed: 0 });
    }

    #[tokio::test]
    async fn test_release_claim_refuses_contact_with_call() {
        let store = InMemoryDialerStore::new();
        let campaign = CampaignId::new();
        store.insert_contacts(vec![contact(&campaign, 1), contact(&campaign, 2)]).await;

        let claimed = store.claim_undialed(&campaign, 2).await.unwrap();
        let call = Call::dial(campaign, claimed[0].id, CallerIdId::new());
        store.create(&call).await.unwrap();

        assert!(!store.release_claim(&claimed[0].id).await.unwrap());
        assert!(store.release_claim(&claimed[1].id).await.unwrap());
        assert!(!store.release_claim(&claimed[1].id).await.unwrap());
        assert_eq!(store.counts(&campaign).await.unwrap().dialed, 1);
    }

    #[tokio::test]
    async fn test_claim_idle_same_key_same_agent() {
        let store = InMemoryDialerStore::new();
        for ext in ["1001", "1002", "1003"] {
            store.insert_agent(Agent::new(format!("Agent {}", ext), ext)).await;
        }

        let first = store.claim_idle(4).await.unwrap().unwrap();
        // key 4 over the two remaining agents selects index 0
        let second = store.claim_idle(4).await.unwrap().unwrap();
        assert_ne!(first.id, second.id);
        assert_eq!(store.count_by_status(AgentStatus::Busy).await.unwrap(), 2);

        store.claim_idle(0).await.unwrap().unwrap();
        assert!(store.claim_idle(0).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_release_agent() {
        let store = InMemoryDialerStore::new();
        let agent = Agent::new("Rina", "2001");
        let id = agent.id;
        store.insert_agent(agent).await;

        assert!(!store.release(&id).await.unwrap());
        store.claim_idle(0).await.unwrap().unwrap();
        assert!(store.release(&id).await.unwrap());
        assert!(matches!(
            store.release(&AgentId::new()).await,
            Err(DomainError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_save_transition_compare_and_set() {
        let store = InMemoryDialerStore::new();
        let mut call = Call::dial(CampaignId::new(), ContactId::new(), CallerIdId::new());
        store.create(&call).await.unwrap();

        call.ring().unwrap();
        assert!(store.save_transition(&call, CallStatus::Dialing).await.unwrap());
        // Stale expectation loses
        assert!(!store.save_transition(&call, CallStatus::Dialing).await.unwrap());

        let stored = CallRepository::find_by_id(&store, call.id()).await.unwrap().unwrap();
        assert_eq!(stored.status(), CallStatus::Ringing);
    }

    #[tokio::test]
    async fn test_cancel_dialing_only_touches_dialing() {
        let store = InMemoryDialerStore::new();
        let campaign = CampaignId::new();
        let other = CampaignId::new();

        let dialing = Call::dial(campaign, ContactId::new(), CallerIdId::new());
        let mut ringing = Call::dial(campaign, ContactId::new(), CallerIdId::new());
        let foreign = Call::dial(other, ContactId::new(), CallerIdId::new());
        for call in [&dialing, &ringing, &foreign] {
            store.create(call).await.unwrap();
        }
        ringing.ring().unwrap();
        store.save_transition(&ringing, CallStatus::Dialing).await.unwrap();

        let cancelled = store.cancel_dialing(&campaign, Utc::now()).await.unwrap();
        assert_eq!(cancelled, 1);

        let calls = store.list_by_campaign(&campaign).await.unwrap();
        assert_eq!(calls[0].status(), CallStatus::Cancelled);
        assert!(calls[0].ended_at().is_some());
        assert_eq!(calls[1].status(), CallStatus::Ringing);

        let foreign_stored = CallRepository::find_by_id(&store, foreign.id()).await.unwrap().unwrap();
        assert_eq!(foreign_stored.status(), CallStatus::Dialing);
    }

    #[tokio::test]
    async fn test_caller_id_active_filter() {
        let store = InMemoryDialerStore::new();
        store.insert_caller_id(CallerId::new("02150001")).await;
        store.insert_caller_id(CallerId::new("02150002")).await;
        store.set_caller_id_active("02150001", false).await;

        let active = CallerIdRepository::list_active(&store).await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].number, "02150002");
    }

    #[tokio::test]
    async fn test_concurrent_agent_claims_are_exclusive() {
        let store = Arc::new(InMemoryDialerStore::new());
        for i in 0..5 {
            store.insert_agent(Agent::new(format!("Agent {}", i), format!("10{:02}", i))).await;
        }

        let mut handles = Vec::new();
        for key in 0..20u64 {
            let store = store.clone();
            handles.push(tokio::spawn(async move { store.claim_idle(key * 7919).await.unwrap() }));
        }

        let mut claimed = HashSet::new();
        for handle in handles {
            if let Some(agent) = handle.await.unwrap() {
                assert!(claimed.insert(agent.id), "agent claimed twice");
            }
        }
        assert_eq!(claimed.len(), 5);
    }
}
