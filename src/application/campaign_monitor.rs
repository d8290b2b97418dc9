//! Campaign monitor - periodic driver over active campaigns

use crate::application::scheduler::{DialResult, DialingScheduler};
use crate::application::stats::StatsAggregator;
use crate::config::MonitorConfig;
use crate::domain::campaign::{Campaign, CampaignRepository};
use crate::domain::shared::result::Result;
use crate::domain::shared::value_objects::CampaignId;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{error, info};

pub struct CampaignMonitor {
    campaigns: Arc<dyn CampaignRepository>,
    scheduler: Arc<DialingScheduler>,
    stats: Arc<StatsAggregator>,
    config: MonitorConfig,
}

impl CampaignMonitor {
    pub fn new(
        campaigns: Arc<dyn CampaignRepository>,
        scheduler: Arc<DialingScheduler>,
        stats: Arc<StatsAggregator>,
        config: MonitorConfig,
    ) -> Self {
        Self {
            campaigns,
            scheduler,
            stats,
            config,
        }
    }

    /// Loop until `shutdown` flips to `true`
    ///
    /// The signal is honoured between iterations and while sleeping; a
    /// running iteration always completes.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!(interval_secs = self.config.interval_secs, "Campaign monitor started");

        loop {
            let stop_requested = *shutdown.borrow();
            if stop_requested {
                break;
            }

            let pause = match self.tick().await {
                Ok(_) => self.config.interval(),
                Err(e) => {
                    error!(error = %e, reason = e.reason(), "Campaign monitor iteration failed");
                    self.config.error_backoff()
                }
            };

            if wait_or_shutdown(pause, &mut shutdown).await {
                break;
            }
        }

        info!("Campaign monitor stopped");
    }

    /// One pass over every active campaign
    ///
    /// A campaign is only dialed when agents are idle and contacts remain.
    pub async fn tick(&self) -> Result<Vec<(CampaignId, DialResult)>> {
        let campaigns = self.campaigns.list_active().await?;
        if campaigns.is_empty() {
            info!("No active campaigns found");
            return Ok(Vec::new());
        }

        let mut results = Vec::new();
        for campaign in campaigns {
            if let Some(result) = self.check_campaign(&campaign).await? {
                results.push((campaign.id, result));
            }
        }

        Ok(results)
    }

    async fn check_campaign(&self, campaign: &Campaign) -> Result<Option<DialResult>> {
        let stats = self.stats.snapshot(&campaign.id).await?;
        info!(
            campaign_id = %campaign.id,
            campaign = %campaign.name,
            idle_agents = stats.idle_agents,
            active_calls = stats.active_calls,
            dialed = stats.dialed_contacts,
            total = stats.total_contacts,
            "Campaign status"
        );

        if stats.idle_agents == 0 || stats.dialed_contacts >= stats.total_contacts {
            return Ok(None);
        }

        let result = self.scheduler.run(campaign).await?;
        info!(campaign_id = %campaign.id, result = %result, calls = result.calls_initiated(), "Dialing run finished");
        Ok(Some(result))
    }
}

/// Sleep for `pause`; `true` if shutdown was requested meanwhile
async fn wait_or_shutdown(pause: Duration, shutdown: &mut watch::Receiver<bool>) -> bool {
    let sender_gone = tokio::select! {
        _ = tokio::time::sleep(pause) => false,
        changed = shutdown.changed() => changed.is_err(),
    };

    sender_gone || *shutdown.borrow()
}
