//! Predictive dialing integration tests against the in-memory store

use async_trait::async_trait;
use predictive_dialer::application::{
    CallLauncher, DialResult, DialerServices, Repositories, TelephonyLauncher,
};
use predictive_dialer::config::{DialingConfig, MonitorConfig};
use predictive_dialer::domain::agent::{Agent, AgentRepository, AgentStatus};
use predictive_dialer::domain::call::{CallRepository, CallStatus, DialOutcome};
use predictive_dialer::domain::caller_id::CallerId;
use predictive_dialer::domain::campaign::Campaign;
use predictive_dialer::domain::contact::Contact;
use predictive_dialer::domain::shared::value_objects::PhoneNumber;
use predictive_dialer::domain::telephony::{DialRequest, TelephonyAdapter};
use predictive_dialer::infrastructure::persistence::InMemoryDialerStore;
use predictive_dialer::interface::api::{EventBroadcaster, PublishedEvent};
use predictive_dialer::Result;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;

#[derive(Default)]
struct RecordingLauncher {
    requests: Mutex<Vec<DialRequest>>,
}

impl RecordingLauncher {
    fn requests(&self) -> Vec<DialRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl CallLauncher for RecordingLauncher {
    fn launch(&self, request: DialRequest) {
        self.requests.lock().unwrap().push(request);
    }
}

/// Answers every call the same way, immediately
struct FixedTelephony(DialOutcome);

#[async_trait]
impl TelephonyAdapter for FixedTelephony {
    async fn place_call(&self, _request: &DialRequest) -> Result<DialOutcome> {
        Ok(self.0)
    }
}

struct Fixture {
    store: Arc<InMemoryDialerStore>,
    services: DialerServices,
    launcher: Arc<RecordingLauncher>,
    events: broadcast::Receiver<PublishedEvent>,
    campaign: Campaign,
}

impl Fixture {
    async fn new(contacts: usize, agents: usize, caller_ids: usize) -> Self {
        let store = Arc::new(InMemoryDialerStore::new());
        let campaign = seed(&store, contacts, agents, caller_ids).await;

        let broadcaster = Arc::new(EventBroadcaster::new(1024));
        let events = broadcaster.subscribe();
        let launcher = Arc::new(RecordingLauncher::default());
        let recording = launcher.clone();

        let services = DialerServices::build_with(
            &dialing_config(),
            Repositories::from_store(store.clone()),
            broadcaster,
            move |_| recording,
        );

        Self {
            store,
            services,
            launcher,
            events,
            campaign,
        }
    }

    fn drain_events(&mut self) -> Vec<PublishedEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            events.push(event);
        }
        events
    }

    async fn calls(&self) -> Vec<predictive_dialer::domain::call::Call> {
        self.store.list_by_campaign(&self.campaign.id).await.unwrap()
    }

    async fn agent_statuses(&self) -> Vec<AgentStatus> {
        self.store.agents().await.into_iter().map(|a| a.status).collect()
    }
}

fn dialing_config() -> DialingConfig {
    DialingConfig {
        dialing_ratio: 1.5,
        max_concurrent_calls: 10,
        selection_seed: Some(7),
    }
}

async fn seed(store: &InMemoryDialerStore, contacts: usize, agents: usize, caller_ids: usize) -> Campaign {
    let campaign = Campaign::new("Kredit Q3").with_product_type("credit_card");
    store.insert_campaign(campaign.clone()).await;

    let contacts: Vec<Contact> = (0..contacts)
        .map(|i| {
            let phone = PhoneNumber::parse(&format!("+62812{:07}", i)).unwrap();
            Contact::new(campaign.id, format!("Contact {}", i), phone)
                .with_balance(2_000_000.0, 75_000.0)
                .with_extra("loan_id", serde_json::json!(format!("LN-{}", i)))
        })
        .collect();
    store.insert_contacts(contacts).await;

    for i in 0..agents {
        store
            .insert_agent(Agent::new(format!("Agent {}", i), format!("10{:02}", i)))
            .await;
    }
    for i in 0..caller_ids {
        store.insert_caller_id(CallerId::new(format!("0215000{}", i))).await;
    }

    campaign
}

#[tokio::test]
async fn test_run_places_ratio_of_idle_agents() {
    let mut fx = Fixture::new(100, 4, 2).await;

    let result = fx.services.scheduler.run(&fx.campaign).await.unwrap();
    assert_eq!(result, DialResult::Started(6));

    let contacts = fx.store.contacts(&fx.campaign.id).await;
    let dialed: Vec<bool> = contacts.iter().map(|c| c.was_dialed).collect();
    assert!(dialed[..6].iter().all(|d| *d));
    assert!(dialed[6..].iter().all(|d| !*d));

    let calls = fx.calls().await;
    assert_eq!(calls.len(), 6);
    assert!(calls.iter().all(|c| c.status() == CallStatus::Dialing));
    assert!(calls.iter().all(|c| c.agent_id().is_none()));
    assert_eq!(fx.launcher.requests().len(), 6);

    let events = fx.drain_events();
    let topics: HashSet<&str> = events.iter().map(|e| e.topic.as_str()).collect();
    assert_eq!(events.len(), 2);
    assert!(events.iter().all(|e| e.event == "dialing.started"));
    assert!(topics.contains(fx.campaign.topic().as_str()));
    assert!(topics.contains("predictive-dialing"));
    assert_eq!(events[0].payload["calls_initiated"], 6);
    assert_eq!(events[0].payload["campaign_name"], "Kredit Q3");
}

#[tokio::test]
async fn test_run_capped_by_max_concurrent_calls() {
    let fx = Fixture::new(100, 20, 1).await;

    let result = fx.services.scheduler.run(&fx.campaign).await.unwrap();
    assert_eq!(result, DialResult::Started(10));
    assert_eq!(fx.calls().await.len(), 10);
}

#[tokio::test]
async fn test_no_idle_agents() {
    let mut fx = Fixture::new(100, 0, 1).await;

    let result = fx.services.scheduler.run(&fx.campaign).await.unwrap();
    assert_eq!(result, DialResult::NoAgentsAvailable);
    assert!(fx.calls().await.is_empty());
    assert!(fx.drain_events().is_empty());
    assert!(fx.store.contacts(&fx.campaign.id).await.iter().all(|c| !c.was_dialed));
}

#[tokio::test]
async fn test_inactive_campaign() {
    let fx = Fixture::new(10, 2, 1).await;
    let campaign = fx.campaign.clone().inactive();

    let result = fx.services.scheduler.run(&campaign).await.unwrap();
    assert_eq!(result, DialResult::NotActive);
    assert!(fx.calls().await.is_empty());
}

#[tokio::test]
async fn test_all_contacts_dialed() {
    let fx = Fixture::new(3, 4, 1).await;

    assert_eq!(fx.services.scheduler.run(&fx.campaign).await.unwrap(), DialResult::Started(3));
    assert_eq!(
        fx.services.scheduler.run(&fx.campaign).await.unwrap(),
        DialResult::AllContactsDialed
    );
    assert_eq!(fx.calls().await.len(), 3);
}

#[tokio::test]
async fn test_no_caller_id_rolls_back_claims() {
    let mut fx = Fixture::new(10, 2, 0).await;

    let result = fx.services.scheduler.run(&fx.campaign).await.unwrap();
    assert_eq!(result, DialResult::NoCallerIdAvailable);
    assert!(fx.calls().await.is_empty());
    assert!(fx.drain_events().is_empty());
    assert!(fx.launcher.requests().is_empty());
    assert!(fx.store.contacts(&fx.campaign.id).await.iter().all(|c| !c.was_dialed));
}

#[tokio::test]
async fn test_answered_call_routed_to_idle_agent() {
    let mut fx = Fixture::new(10, 1, 1).await;

    fx.services.scheduler.run(&fx.campaign).await.unwrap();
    fx.drain_events();

    let request = fx.launcher.requests().remove(0);
    let status = fx
        .services
        .reporter
        .report(&request.call_id, DialOutcome::Answered)
        .await
        .unwrap();
    assert_eq!(status, CallStatus::Connected);

    let call = CallRepository::find_by_id(fx.store.as_ref(), &request.call_id)
        .await
        .unwrap()
        .unwrap();
    let agent_id = *call.agent_id().expect("connected call has an agent");
    assert_eq!(call.status(), CallStatus::Connected);

    let agent = AgentRepository::find_by_id(fx.store.as_ref(), &agent_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(agent.status, AgentStatus::Busy);

    let events = fx.drain_events();
    assert_eq!(events.len(), 2);
    assert!(events.iter().all(|e| e.event == "call.routed"));
    assert!(events.iter().any(|e| e.topic == format!("agent.{}", agent_id)));
    assert!(events.iter().any(|e| e.topic == fx.campaign.topic()));

    let payload = &events[0].payload;
    assert_eq!(payload["call_id"], request.call_id.to_string());
    assert_eq!(payload["agent"]["extension"], agent.extension);
    assert_eq!(payload["contact"]["outstanding_balance"], 2_000_000.0);
    assert_eq!(payload["contact"]["extra"]["loan_id"], "LN-0");
}

#[tokio::test]
async fn test_answered_call_without_agent() {
    let mut fx = Fixture::new(10, 1, 1).await;

    // One idle agent gives two calls; the first answer takes the only agent
    fx.services.scheduler.run(&fx.campaign).await.unwrap();
    let requests = fx.launcher.requests();
    assert_eq!(requests.len(), 2);

    let first = fx
        .services
        .reporter
        .report(&requests[0].call_id, DialOutcome::Answered)
        .await
        .unwrap();
    assert_eq!(first, CallStatus::Connected);
    fx.drain_events();

    let second = fx
        .services
        .reporter
        .report(&requests[1].call_id, DialOutcome::Answered)
        .await
        .unwrap();
    assert_eq!(second, CallStatus::NoAgentAvailable);

    let call = CallRepository::find_by_id(fx.store.as_ref(), &requests[1].call_id)
        .await
        .unwrap()
        .unwrap();
    assert!(call.ended_at().is_some());
    assert!(call.agent_id().is_none());
    assert!(fx.drain_events().is_empty());
}

#[tokio::test]
async fn test_non_answered_outcomes_are_terminal() {
    let fx = Fixture::new(10, 2, 1).await;
    fx.services.scheduler.run(&fx.campaign).await.unwrap();

    let requests = fx.launcher.requests();
    let outcomes = [DialOutcome::Busy, DialOutcome::NoAnswer, DialOutcome::Failed];
    for (request, outcome) in requests.iter().zip(outcomes) {
        let status = fx.services.reporter.report(&request.call_id, outcome).await.unwrap();
        assert_eq!(Some(status), outcome.terminal_status());

        let call = CallRepository::find_by_id(fx.store.as_ref(), &request.call_id)
            .await
            .unwrap()
            .unwrap();
        assert!(call.ended_at().is_some());
    }

    // A second report does not move a terminal call
    let again = fx
        .services
        .reporter
        .report(&requests[0].call_id, DialOutcome::Answered)
        .await
        .unwrap();
    assert_eq!(again, CallStatus::Busy);
    assert!(fx.agent_statuses().await.iter().all(|s| *s == AgentStatus::Idle));
}

#[tokio::test]
async fn test_stop_cancels_only_dialing_calls() {
    let fx = Fixture::new(10, 2, 1).await;
    fx.services.scheduler.run(&fx.campaign).await.unwrap();

    let requests = fx.launcher.requests();
    assert_eq!(requests.len(), 3);
    fx.services
        .reporter
        .report(&requests[0].call_id, DialOutcome::Answered)
        .await
        .unwrap();
    fx.services
        .reporter
        .report(&requests[1].call_id, DialOutcome::Busy)
        .await
        .unwrap();

    assert!(fx.services.scheduler.stop(&fx.campaign).await.unwrap());

    let statuses: Vec<(String, CallStatus)> = fx
        .calls()
        .await
        .iter()
        .map(|c| (c.id().to_string(), c.status()))
        .collect();
    let status_of = |id: &str| statuses.iter().find(|(c, _)| c == id).map(|(_, s)| *s);

    assert_eq!(status_of(&requests[0].call_id.to_string()), Some(CallStatus::Connected));
    assert_eq!(status_of(&requests[1].call_id.to_string()), Some(CallStatus::Busy));
    assert_eq!(status_of(&requests[2].call_id.to_string()), Some(CallStatus::Cancelled));

    // The cancelled call ignores its late outcome and keeps no agent
    let late = fx
        .services
        .reporter
        .report(&requests[2].call_id, DialOutcome::Answered)
        .await
        .unwrap();
    assert_eq!(late, CallStatus::Cancelled);
    let busy = fx.agent_statuses().await.iter().filter(|s| **s == AgentStatus::Busy).count();
    assert_eq!(busy, 1);
}

#[tokio::test]
async fn test_stop_leaves_other_campaigns_alone() {
    let fx = Fixture::new(10, 2, 1).await;
    let other = seed(&fx.store, 10, 0, 0).await;

    fx.services.scheduler.run(&fx.campaign).await.unwrap();
    fx.services.scheduler.run(&other).await.unwrap();
    fx.services.scheduler.stop(&other).await.unwrap();

    assert!(fx.calls().await.iter().all(|c| c.status() == CallStatus::Dialing));
}

#[tokio::test]
async fn test_stats_snapshot() {
    let fx = Fixture::new(20, 2, 1).await;
    fx.services.scheduler.run(&fx.campaign).await.unwrap();

    let requests = fx.launcher.requests();
    fx.services
        .reporter
        .report(&requests[0].call_id, DialOutcome::Answered)
        .await
        .unwrap();
    fx.services
        .reporter
        .report(&requests[1].call_id, DialOutcome::NoAnswer)
        .await
        .unwrap();

    let stats = fx.services.stats.snapshot(&fx.campaign.id).await.unwrap();
    assert_eq!(stats.total_contacts, 20);
    assert_eq!(stats.dialed_contacts, 3);
    assert_eq!(stats.remaining_contacts(), 17);
    assert_eq!(stats.active_calls, 2);
    assert_eq!(stats.completed_calls, 1);
    assert_eq!(stats.idle_agents, 1);
    assert_eq!(stats.busy_agents, 1);
    assert!(stats.active_calls + stats.completed_calls <= fx.calls().await.len() as u64);
}

#[tokio::test]
async fn test_concurrent_runs_never_share_contacts() {
    let fx = Arc::new(Fixture::new(40, 4, 2).await);

    let mut handles = Vec::new();
    for _ in 0..8 {
        let fx = fx.clone();
        handles.push(tokio::spawn(async move {
            fx.services.scheduler.run(&fx.campaign).await.unwrap()
        }));
    }

    let mut created = 0;
    for handle in handles {
        let result = handle.await.unwrap();
        assert!(result.calls_initiated() <= 6);
        created += result.calls_initiated();
    }

    let calls = fx.calls().await;
    assert_eq!(calls.len(), created);
    assert_eq!(created, 40);

    let contact_ids: HashSet<_> = calls.iter().map(|c| *c.contact_id()).collect();
    assert_eq!(contact_ids.len(), calls.len());

    let contacts = fx.store.contacts(&fx.campaign.id).await;
    for contact in contacts {
        assert!(contact.was_dialed);
        assert!(contact_ids.contains(&contact.id));
    }
}

#[tokio::test]
async fn test_concurrent_answers_never_share_agents() {
    let fx = Arc::new(Fixture::new(20, 4, 1).await);
    fx.services.scheduler.run(&fx.campaign).await.unwrap();

    let requests = fx.launcher.requests();
    assert_eq!(requests.len(), 6);

    let mut handles = Vec::new();
    for request in requests {
        let fx = fx.clone();
        handles.push(tokio::spawn(async move {
            fx.services
                .reporter
                .report(&request.call_id, DialOutcome::Answered)
                .await
                .unwrap()
        }));
    }

    let mut connected = 0;
    let mut dropped = 0;
    for handle in handles {
        match handle.await.unwrap() {
            CallStatus::Connected => connected += 1,
            CallStatus::NoAgentAvailable => dropped += 1,
            other => panic!("unexpected status {}", other),
        }
    }
    assert_eq!(connected, 4);
    assert_eq!(dropped, 2);

    let agents: HashSet<_> = fx
        .calls()
        .await
        .iter()
        .filter_map(|c| c.agent_id().copied())
        .collect();
    assert_eq!(agents.len(), 4);
    assert!(fx.agent_statuses().await.iter().all(|s| *s == AgentStatus::Busy));
}

#[tokio::test]
async fn test_released_agent_takes_next_call() {
    let fx = Fixture::new(10, 1, 1).await;
    fx.services.scheduler.run(&fx.campaign).await.unwrap();
    let requests = fx.launcher.requests();

    fx.services
        .reporter
        .report(&requests[0].call_id, DialOutcome::Answered)
        .await
        .unwrap();
    let agent_id = fx.store.agents().await[0].id;

    assert!(fx.services.agents.release(&agent_id).await.unwrap());
    assert!(!fx.services.agents.release(&agent_id).await.unwrap());

    let status = fx
        .services
        .reporter
        .report(&requests[1].call_id, DialOutcome::Answered)
        .await
        .unwrap();
    assert_eq!(status, CallStatus::Connected);
}

#[tokio::test]
async fn test_monitor_tick_dials_active_campaigns() {
    let fx = Fixture::new(10, 2, 1).await;
    let idle_campaign = seed(&fx.store, 0, 0, 0).await;
    let monitor = fx.services.monitor(MonitorConfig {
        interval_secs: 30,
        error_backoff_secs: 5,
    });

    let results = monitor.tick().await.unwrap();
    assert_eq!(results, vec![(fx.campaign.id, DialResult::Started(3))]);
    assert!(results.iter().all(|(id, _)| *id != idle_campaign.id));
}

#[tokio::test]
async fn test_monitor_skips_when_agents_busy() {
    let fx = Fixture::new(10, 1, 1).await;
    fx.services.scheduler.run(&fx.campaign).await.unwrap();
    let requests = fx.launcher.requests();
    fx.services
        .reporter
        .report(&requests[0].call_id, DialOutcome::Answered)
        .await
        .unwrap();

    let monitor = fx.services.monitor(MonitorConfig {
        interval_secs: 30,
        error_backoff_secs: 5,
    });
    assert!(monitor.tick().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_telephony_launcher_end_to_end() {
    let store = Arc::new(InMemoryDialerStore::new());
    let campaign = seed(&store, 10, 2, 1).await;

    let mut launcher = None;
    let services = DialerServices::build_with(
        &dialing_config(),
        Repositories::from_store(store.clone()),
        Arc::new(EventBroadcaster::default()),
        |reporter| {
            let telephony = Arc::new(TelephonyLauncher::new(
                Arc::new(FixedTelephony(DialOutcome::Busy)),
                reporter,
            ));
            launcher = Some(telephony.clone());
            telephony
        },
    );
    let launcher = launcher.unwrap();

    assert_eq!(services.scheduler.run(&campaign).await.unwrap(), DialResult::Started(3));
    launcher.drain().await;

    let calls = store.list_by_campaign(&campaign.id).await.unwrap();
    assert_eq!(calls.len(), 3);
    assert!(calls.iter().all(|c| c.status() == CallStatus::Busy));

    let stats = services.stats.snapshot(&campaign.id).await.unwrap();
    assert_eq!(stats.completed_calls, 3);
    assert_eq!(stats.active_calls, 0);
}
