//! Service wiring shared by the binary and the integration tests

use crate::application::campaign_monitor::CampaignMonitor;
use crate::application::launcher::{CallLauncher, TelephonyLauncher};
use crate::application::outcome_reporter::OutcomeReporter;
use crate::application::scheduler::DialingScheduler;
use crate::application::stats::StatsAggregator;
use crate::config::{DialingConfig, MonitorConfig};
use crate::domain::agent::{AgentPool, AgentRepository};
use crate::domain::call::CallRepository;
use crate::domain::caller_id::{CallerIdRepository, CallerIdSelector};
use crate::domain::campaign::CampaignRepository;
use crate::domain::contact::{ContactLedger, ContactRepository};
use crate::domain::notification::Notifier;
use crate::domain::shared::random::RandomSource;
use crate::domain::telephony::TelephonyAdapter;
use std::sync::Arc;

/// The five repository ports, usually backed by one store
#[derive(Clone)]
pub struct Repositories {
    pub campaigns: Arc<dyn CampaignRepository>,
    pub agents: Arc<dyn AgentRepository>,
    pub contacts: Arc<dyn ContactRepository>,
    pub caller_ids: Arc<dyn CallerIdRepository>,
    pub calls: Arc<dyn CallRepository>,
}

impl Repositories {
    pub fn from_store<S>(store: Arc<S>) -> Self
    where
        S: CampaignRepository
            + AgentRepository
            + ContactRepository
            + CallerIdRepository
            + CallRepository
            + 'static,
    {
        Self {
            campaigns: store.clone(),
            agents: store.clone(),
            contacts: store.clone(),
            caller_ids: store.clone(),
            calls: store,
        }
    }
}

pub struct DialerServices {
    pub campaigns: Arc<dyn CampaignRepository>,
    pub agents: Arc<AgentPool>,
    pub contacts: Arc<ContactLedger>,
    pub scheduler: Arc<DialingScheduler>,
    pub reporter: Arc<OutcomeReporter>,
    pub stats: Arc<StatsAggregator>,
}

impl DialerServices {
    /// Wire everything with calls placed through `telephony`
    pub fn build(
        config: &DialingConfig,
        repositories: Repositories,
        notifier: Arc<dyn Notifier>,
        telephony: Arc<dyn TelephonyAdapter>,
    ) -> Self {
        Self::build_with(config, repositories, notifier, |reporter| {
            Arc::new(TelephonyLauncher::new(telephony, reporter))
        })
    }

    /// Wire everything with a caller-supplied launcher
    pub fn build_with<F>(
        config: &DialingConfig,
        repositories: Repositories,
        notifier: Arc<dyn Notifier>,
        make_launcher: F,
    ) -> Self
    where
        F: FnOnce(Arc<OutcomeReporter>) -> Arc<dyn CallLauncher>,
    {
        let rng = Arc::new(RandomSource::from_optional_seed(config.selection_seed));

        let agents = Arc::new(AgentPool::new(repositories.agents, rng.clone()));
        let contacts = Arc::new(ContactLedger::new(repositories.contacts.clone()));
        let caller_ids = Arc::new(CallerIdSelector::new(repositories.caller_ids, rng));

        let reporter = Arc::new(OutcomeReporter::new(
            repositories.calls.clone(),
            repositories.contacts,
            agents.clone(),
            notifier.clone(),
        ));

        let scheduler = Arc::new(DialingScheduler::new(
            config.clone(),
            agents.clone(),
            contacts.clone(),
            caller_ids,
            repositories.calls.clone(),
            notifier,
            make_launcher(reporter.clone()),
        ));

        let stats = Arc::new(StatsAggregator::new(
            contacts.clone(),
            repositories.calls,
            agents.clone(),
        ));

        Self {
            campaigns: repositories.campaigns,
            agents,
            contacts,
            scheduler,
            reporter,
            stats,
        }
    }

    pub fn monitor(&self, config: MonitorConfig) -> CampaignMonitor {
        CampaignMonitor::new(
            self.campaigns.clone(),
            self.scheduler.clone(),
            self.stats.clone(),
            config,
        )
    }
}
