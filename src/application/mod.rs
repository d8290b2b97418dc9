//! Application layer - Use cases and application services
//!
//! This layer orchestrates domain objects to fulfill use cases:
//! - Dialing runs and campaign stop
//! - Applying telephony outcomes
//! - Statistics snapshots
//! - The periodic campaign monitor

pub mod campaign_monitor;
pub mod launcher;
pub mod outcome_reporter;
pub mod scheduler;
pub mod services;
pub mod stats;

pub use campaign_monitor::CampaignMonitor;
pub use launcher::{CallLauncher, TelephonyLauncher};
pub use outcome_reporter::OutcomeReporter;
pub use scheduler::{DialResult, DialingScheduler};
pub use services::{DialerServices, Repositories};
pub use stats::{DialingStats, StatsAggregator};
