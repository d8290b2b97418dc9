//! Dialing scheduler - decides how many calls a campaign places and creates them

use crate::application::launcher::CallLauncher;
use crate::config::DialingConfig;
use crate::domain::agent::AgentPool;
use crate::domain::call::{Call, CallRepository};
use crate::domain::caller_id::CallerIdSelector;
use crate::domain::campaign::Campaign;
use crate::domain::contact::{Contact, ContactLedger};
use crate::domain::notification::{publish_event, DialingStarted, Notifier};
use crate::domain::shared::result::Result;
use crate::domain::shared::value_objects::ContactId;
use crate::domain::telephony::DialRequest;
use crate::infrastructure::metrics;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// What a single `run` did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", content = "calls_initiated", rename_all = "snake_case")]
pub enum DialResult {
    NotActive,
    NoAgentsAvailable,
    AllContactsDialed,
    NoCallerIdAvailable,
    Started(usize),
}

impl DialResult {
    pub fn as_str(&self) -> &'static str {
        match self {
            DialResult::NotActive => "not_active",
            DialResult::NoAgentsAvailable => "no_agents_available",
            DialResult::AllContactsDialed => "all_contacts_dialed",
            DialResult::NoCallerIdAvailable => "no_caller_id_available",
            DialResult::Started(_) => "started",
        }
    }

    pub fn calls_initiated(&self) -> usize {
        match self {
            DialResult::Started(count) => *count,
            _ => 0,
        }
    }

    pub fn is_started(&self) -> bool {
        matches!(self, DialResult::Started(_))
    }

    /// Human readable explanation for operators
    pub fn message(&self) -> String {
        match self {
            DialResult::NotActive => "Campaign is not active".to_string(),
            DialResult::NoAgentsAvailable => "No idle agents available".to_string(),
            DialResult::AllContactsDialed => "All contacts have been dialed".to_string(),
            DialResult::NoCallerIdAvailable => "No active caller-id available".to_string(),
            DialResult::Started(count) => format!("Predictive dialing started with {} calls", count),
        }
    }
}

impl fmt::Display for DialResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub struct DialingScheduler {
    config: DialingConfig,
    agents: Arc<AgentPool>,
    contacts: Arc<ContactLedger>,
    caller_ids: Arc<CallerIdSelector>,
    calls: Arc<dyn CallRepository>,
    notifier: Arc<dyn Notifier>,
    launcher: Arc<dyn CallLauncher>,
}

impl DialingScheduler {
    pub fn new(
        config: DialingConfig,
        agents: Arc<AgentPool>,
        contacts: Arc<ContactLedger>,
        caller_ids: Arc<CallerIdSelector>,
        calls: Arc<dyn CallRepository>,
        notifier: Arc<dyn Notifier>,
        launcher: Arc<dyn CallLauncher>,
    ) -> Self {
        Self {
            config,
            agents,
            contacts,
            caller_ids,
            calls,
            notifier,
            launcher,
        }
    }

    pub fn config(&self) -> &DialingConfig {
        &self.config
    }

    /// One dialing pass for `campaign`
    ///
    /// Never places more than `min(ceil(idle * ratio), max_concurrent_calls)`
    /// calls. Policy rejections come back as [`DialResult`] variants; only
    /// infrastructure failures are errors.
    pub async fn run(&self, campaign: &Campaign) -> Result<DialResult> {
        let timer = Instant::now();
        let result = self.dial(campaign).await?;
        metrics::record_dial_run(result.as_str(), timer.elapsed());
        Ok(result)
    }

    async fn dial(&self, campaign: &Campaign) -> Result<DialResult> {
        if !campaign.is_active {
            info!(campaign_id = %campaign.id, "Campaign is not active, skipping");
            return Ok(DialResult::NotActive);
        }

        let idle = self.agents.count_idle().await?;
        metrics::update_idle_agents(idle);
        if idle == 0 {
            info!(campaign_id = %campaign.id, "No idle agents available");
            return Ok(DialResult::NoAgentsAvailable);
        }

        let calls_to_make = self.config.calls_to_make(idle);
        debug!(
            campaign_id = %campaign.id,
            idle_agents = idle,
            ratio = self.config.dialing_ratio,
            calls_to_make,
            "Dialing decision"
        );

        let contacts = self.contacts.claim_batch(&campaign.id, calls_to_make).await?;
        if contacts.is_empty() {
            info!(campaign_id = %campaign.id, "All contacts have been dialed");
            return Ok(DialResult::AllContactsDialed);
        }

        let requests = self.create_calls(campaign, idle, &contacts).await?;
        if requests.is_empty() {
            warn!(campaign_id = %campaign.id, claimed = contacts.len(), "No call created, no active caller-id");
            return Ok(DialResult::NoCallerIdAvailable);
        }

        let count = requests.len();
        let published = self.announce(campaign, idle, count).await;

        // Calls already exist; they go out even if the notification failed
        for request in requests {
            self.launcher.launch(request);
        }

        published?;
        Ok(DialResult::Started(count))
    }

    /// Record, log and publish `dialing.started` for `count` new calls
    async fn announce(&self, campaign: &Campaign, idle: usize, count: usize) -> Result<()> {
        metrics::record_calls_initiated(&campaign.id.to_string(), count);
        info!(
            campaign_id = %campaign.id,
            campaign = %campaign.name,
            idle_agents = idle,
            calls_initiated = count,
            "Predictive dialing started"
        );

        publish_event(self.notifier.as_ref(), &DialingStarted::new(campaign, count)).await
    }

    /// Create one `dialing` call per claimed contact
    ///
    /// A contact without a caller-id is released and skipped. On an
    /// infrastructure error every claimed contact still without a call is
    /// released and calls already created are announced and launched before
    /// the error is returned.
    async fn create_calls(
        &self,
        campaign: &Campaign,
        idle: usize,
        contacts: &[Contact],
    ) -> Result<Vec<DialRequest>> {
        let mut requests = Vec::with_capacity(contacts.len());

        for (index, contact) in contacts.iter().enumerate() {
            let step = match self.create_call(campaign, contact).await {
                Ok(Some(request)) => {
                    requests.push(request);
                    continue;
                }
                Ok(None) => {
                    warn!(campaign_id = %campaign.id, contact_id = %contact.id, "No active caller-id, releasing contact");
                    self.contacts.release(&contact.id).await.map(|_| ())
                }
                Err(e) => Err(e),
            };

            if let Err(e) = step {
                let pending: Vec<ContactId> = contacts[index..].iter().map(|c| c.id).collect();
                let released = self.contacts.release_all(&pending).await;
                warn!(
                    campaign_id = %campaign.id,
                    error = %e,
                    released,
                    launched = requests.len(),
                    "Call creation failed, released pending contacts"
                );

                // Calls created before the failure still go out
                if !requests.is_empty() {
                    if let Err(publish_error) = self.announce(campaign, idle, requests.len()).await {
                        warn!(campaign_id = %campaign.id, error = %publish_error, "Failed to publish dialing.started");
                    }
                }
                for request in requests {
                    self.launcher.launch(request);
                }
                return Err(e);
            }
        }

        Ok(requests)
    }

    async fn create_call(&self, campaign: &Campaign, contact: &Contact) -> Result<Option<DialRequest>> {
        let Some(caller_id) = self.caller_ids.select().await? else {
            return Ok(None);
        };

        let call = Call::dial(campaign.id, contact.id, caller_id.id);
        self.calls.create(&call).await?;
        debug!(
            call_id = %call.id(),
            contact_id = %contact.id,
            caller_id = %caller_id.number,
            "Call created"
        );

        Ok(Some(DialRequest {
            call_id: *call.id(),
            campaign_id: campaign.id,
            destination: contact.phone.clone(),
            caller_id_number: caller_id.number,
        }))
    }

    /// Cancel every call of the campaign still `dialing`
    ///
    /// Calls in any other status are left alone. Always `true` on success.
    pub async fn stop(&self, campaign: &Campaign) -> Result<bool> {
        let cancelled = self.calls.cancel_dialing(&campaign.id, Utc::now()).await?;
        metrics::record_calls_cancelled(cancelled);
        info!(campaign_id = %campaign.id, cancelled, "Predictive dialing stopped");
        Ok(true)
    }
}
