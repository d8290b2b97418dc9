//! Outcome reporter - single entry point for telephony results
//!
//! Every transition is written with compare-and-set on the status the
//! reporter read, so an outcome racing a campaign stop loses cleanly.

use crate::domain::agent::{Agent, AgentPool};
use crate::domain::call::{Call, CallRepository, CallStatus, DialOutcome};
use crate::domain::contact::{Contact, ContactRepository};
use crate::domain::notification::{publish_event, CallRouted, Notifier};
use crate::domain::shared::error::DomainError;
use crate::domain::shared::result::Result;
use crate::domain::shared::value_objects::CallId;
use crate::infrastructure::metrics;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct OutcomeReporter {
    calls: Arc<dyn CallRepository>,
    contacts: Arc<dyn ContactRepository>,
    agents: Arc<AgentPool>,
    notifier: Arc<dyn Notifier>,
}

impl OutcomeReporter {
    pub fn new(
        calls: Arc<dyn CallRepository>,
        contacts: Arc<dyn ContactRepository>,
        agents: Arc<AgentPool>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            calls,
            contacts,
            agents,
            notifier,
        }
    }

    /// Apply a telephony outcome and return the status the call ends up in
    ///
    /// Outcomes for calls no longer `dialing` (cancelled, or already reported)
    /// are ignored and the current status is returned.
    pub async fn report(&self, call_id: &CallId, outcome: DialOutcome) -> Result<CallStatus> {
        let call = self
            .calls
            .find_by_id(call_id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("Call {}", call_id)))?;

        if call.status() != CallStatus::Dialing {
            debug!(call_id = %call_id, status = %call.status(), outcome = %outcome, "Outcome ignored");
            return Ok(call.status());
        }

        match outcome {
            DialOutcome::Answered => self.answer(call).await,
            _ => self.finish(call, outcome).await,
        }
    }

    async fn finish(&self, mut call: Call, outcome: DialOutcome) -> Result<CallStatus> {
        let expected = call.status();
        call.finish(outcome)?;

        if !self.calls.save_transition(&call, expected).await? {
            return self.current_status(call.id()).await;
        }

        metrics::record_call_outcome(call.status());
        debug!(call_id = %call.id(), status = %call.status(), "Call finished");
        Ok(call.status())
    }

    async fn answer(&self, mut call: Call) -> Result<CallStatus> {
        let contact = match self.load_contact(&call).await {
            Ok(contact) => contact,
            Err(e) => {
                warn!(call_id = %call.id(), contact_id = %call.contact_id(), error = %e, "Contact unavailable, failing call");
                // Leave no call stuck in dialing
                self.finish(call, DialOutcome::Failed).await?;
                return Err(e);
            }
        };

        call.ring()?;
        if !self.calls.save_transition(&call, CallStatus::Dialing).await? {
            return self.current_status(call.id()).await;
        }

        let agent = match self.agents.claim_random_idle().await {
            Ok(Some(agent)) => agent,
            Ok(None) => return self.abandon(call).await,
            Err(e) => {
                // Leave no call stuck in ringing
                self.abandon(call).await?;
                return Err(e);
            }
        };

        self.connect(call, &contact, agent).await
    }

    async fn connect(&self, mut call: Call, contact: &Contact, agent: Agent) -> Result<CallStatus> {
        call.connect(agent.id)?;

        let saved = match self.calls.save_transition(&call, CallStatus::Ringing).await {
            Ok(saved) => saved,
            Err(e) => {
                self.release_agent(&agent).await;
                return Err(e);
            }
        };

        if !saved {
            self.release_agent(&agent).await;
            return self.current_status(call.id()).await;
        }

        metrics::record_call_outcome(CallStatus::Connected);
        metrics::record_call_routed(&call.campaign_id().to_string());
        info!(
            call_id = %call.id(),
            agent_id = %agent.id,
            extension = %agent.extension,
            contact_id = %contact.id,
            "Call routed to agent"
        );

        let event = CallRouted::new(*call.id(), *call.campaign_id(), contact, &agent);
        publish_event(self.notifier.as_ref(), &event).await?;

        Ok(CallStatus::Connected)
    }

    async fn abandon(&self, mut call: Call) -> Result<CallStatus> {
        call.abandon_without_agent()?;

        if !self.calls.save_transition(&call, CallStatus::Ringing).await? {
            return self.current_status(call.id()).await;
        }

        metrics::record_call_outcome(CallStatus::NoAgentAvailable);
        warn!(call_id = %call.id(), campaign_id = %call.campaign_id(), "Answered call dropped, no idle agent");
        Ok(CallStatus::NoAgentAvailable)
    }

    async fn release_agent(&self, agent: &Agent) {
        if let Err(e) = self.agents.release(&agent.id).await {
            warn!(agent_id = %agent.id, error = %e, "Failed to release agent");
        }
    }

    async fn load_contact(&self, call: &Call) -> Result<Contact> {
        self.contacts
            .find_by_id(call.contact_id())
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("Contact {}", call.contact_id())))
    }

    async fn current_status(&self, call_id: &CallId) -> Result<CallStatus> {
        let call = self
            .calls
            .find_by_id(call_id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("Call {}", call_id)))?;

        debug!(call_id = %call_id, status = %call.status(), "Transition lost to a concurrent update");
        Ok(call.status())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::agent::repository::MockAgentRepository;
    use crate::domain::call::repository::MockCallRepository;
    use crate::domain::contact::repository::MockContactRepository;
    use crate::domain::notification::MockNotifier;
    use crate::domain::shared::random::RandomSource;
    use crate::domain::shared::value_objects::{CallerIdId, CampaignId, ContactId, PhoneNumber};

    fn test_contact(campaign_id: CampaignId) -> Contact {
        Contact::new(campaign_id, "Budi", PhoneNumber::parse("081200000001").unwrap())
    }

    fn reporter(
        calls: MockCallRepository,
        contacts: MockContactRepository,
        agents: MockAgentRepository,
        notifier: MockNotifier,
    ) -> OutcomeReporter {
        let pool = AgentPool::new(Arc::new(agents), Arc::new(RandomSource::seeded(3)));
        OutcomeReporter::new(Arc::new(calls), Arc::new(contacts), Arc::new(pool), Arc::new(notifier))
    }

    #[tokio::test]
    async fn test_unknown_call_is_not_found() {
        let mut calls = MockCallRepository::new();
        calls.expect_find_by_id().returning(|_| Ok(None));

        let reporter = reporter(
            calls,
            MockContactRepository::new(),
            MockAgentRepository::new(),
            MockNotifier::new(),
        );

        let result = reporter.report(&CallId::new(), DialOutcome::Busy).await;
        assert!(matches!(result, Err(DomainError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_outcome_for_cancelled_call_is_ignored() {
        let mut call = Call::dial(CampaignId::new(), ContactId::new(), CallerIdId::new());
        call.cancel().unwrap();

        let mut calls = MockCallRepository::new();
        calls
            .expect_find_by_id()
            .returning(move |_| Ok(Some(call.clone())));
        calls.expect_save_transition().never();

        let mut agents = MockAgentRepository::new();
        agents.expect_claim_idle().never();

        let reporter = reporter(calls, MockContactRepository::new(), agents, MockNotifier::new());
        let status = reporter.report(&CallId::new(), DialOutcome::Answered).await.unwrap();
        assert_eq!(status, CallStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_agent_released_when_connect_loses_race() {
        let campaign_id = CampaignId::new();
        let contact = test_contact(campaign_id);
        let call = Call::dial(campaign_id, contact.id, CallerIdId::new());
        let agent = Agent::new("Sari", "1001");
        let agent_id = agent.id;

        let mut calls = MockCallRepository::new();
        let stored = call.clone();
        calls
            .expect_find_by_id()
            .returning(move |_| Ok(Some(stored.clone())));
        calls
            .expect_save_transition()
            .returning(|_, expected| Ok(expected == CallStatus::Dialing));

        let mut contacts = MockContactRepository::new();
        contacts
            .expect_find_by_id()
            .returning(move |_| Ok(Some(contact.clone())));

        let mut agents = MockAgentRepository::new();
        agents
            .expect_claim_idle()
            .returning(move |_| Ok(Some(agent.clone())));
        agents
            .expect_find_by_id()
            .returning(move |_| Ok(Some(Agent::new("Sari", "1001"))));
        agents
            .expect_release()
            .withf(move |id| *id == agent_id)
            .times(1)
            .returning(|_| Ok(true));

        let mut notifier = MockNotifier::new();
        notifier.expect_publish().never();

        let reporter = reporter(calls, contacts, agents, notifier);
        reporter.report(call.id(), DialOutcome::Answered).await.unwrap();
    }

    #[tokio::test]
    async fn test_agent_claim_error_abandons_call() {
        let campaign_id = CampaignId::new();
        let contact = test_contact(campaign_id);
        let call = Call::dial(campaign_id, contact.id, CallerIdId::new());

        let mut calls = MockCallRepository::new();
        let stored = call.clone();
        calls
            .expect_find_by_id()
            .returning(move |_| Ok(Some(stored.clone())));
        calls
            .expect_save_transition()
            .withf(|call, _| call.status() == CallStatus::Ringing)
            .times(1)
            .returning(|_, _| Ok(true));
        calls
            .expect_save_transition()
            .withf(|call, expected| {
                call.status() == CallStatus::NoAgentAvailable && *expected == CallStatus::Ringing
            })
            .times(1)
            .returning(|_, _| Ok(true));

        let mut contacts = MockContactRepository::new();
        contacts
            .expect_find_by_id()
            .returning(move |_| Ok(Some(contact.clone())));

        let mut agents = MockAgentRepository::new();
        agents
            .expect_claim_idle()
            .returning(|_| Err(DomainError::Repository("connection reset".into())));

        let reporter = reporter(calls, contacts, agents, MockNotifier::new());
        let result = reporter.report(call.id(), DialOutcome::Answered).await;
        assert!(matches!(result, Err(DomainError::Repository(_))));
    }

    #[tokio::test]
    async fn test_contact_lookup_error_fails_call() {
        let call = Call::dial(CampaignId::new(), ContactId::new(), CallerIdId::new());

        let mut calls = MockCallRepository::new();
        let stored = call.clone();
        calls
            .expect_find_by_id()
            .returning(move |_| Ok(Some(stored.clone())));
        calls
            .expect_save_transition()
            .withf(|call, expected| {
                call.status() == CallStatus::Failed && *expected == CallStatus::Dialing
            })
            .times(1)
            .returning(|_, _| Ok(true));

        let mut contacts = MockContactRepository::new();
        contacts
            .expect_find_by_id()
            .returning(|_| Err(DomainError::Repository("connection reset".into())));

        let mut agents = MockAgentRepository::new();
        agents.expect_claim_idle().never();

        let reporter = reporter(calls, contacts, agents, MockNotifier::new());
        let result = reporter.report(call.id(), DialOutcome::Answered).await;
        assert!(matches!(result, Err(DomainError::Repository(_))));
    }

    #[tokio::test]
    async fn test_missing_contact_fails_call() {
        let call = Call::dial(CampaignId::new(), ContactId::new(), CallerIdId::new());

        let mut calls = MockCallRepository::new();
        let stored = call.clone();
        calls
            .expect_find_by_id()
            .returning(move |_| Ok(Some(stored.clone())));
        calls
            .expect_save_transition()
            .withf(|call, _| call.status() == CallStatus::Failed)
            .times(1)
            .returning(|_, _| Ok(true));

        let mut contacts = MockContactRepository::new();
        contacts.expect_find_by_id().returning(|_| Ok(None));

        let reporter = reporter(calls, contacts, MockAgentRepository::new(), MockNotifier::new());
        let result = reporter.report(call.id(), DialOutcome::Answered).await;
        assert!(matches!(result, Err(DomainError::NotFound(_))));
    }
}
