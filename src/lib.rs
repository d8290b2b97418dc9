//! Predictive dialer - outbound call pacing for call-center campaigns
//!
//! Decides how many calls a campaign places given its idle agents, tracks
//! every call through its lifecycle, and bridges answered calls to agents
//! without double-dialing a contact or double-assigning an agent.

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod interface;

// Re-export commonly used types
pub use domain::shared::error::DomainError;
pub use domain::shared::result::Result;
