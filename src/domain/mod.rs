//! Domain layer - Core business logic and rules
//!
//! This layer contains:
//! - Aggregates and entities: calls, campaigns, contacts, agents, caller-ids
//! - Domain services: agent pool, contact ledger, caller-id selection
//! - Repository interfaces: ports for persistence
//! - Ports for notifications and telephony

pub mod agent;
pub mod call;
pub mod caller_id;
pub mod campaign;
pub mod contact;
pub mod notification;
pub mod shared;
pub mod telephony;

// Re-export commonly used types
pub use shared::{DomainError, Result};
