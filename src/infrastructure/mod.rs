//! Infrastructure layer - Technical implementations
//!
//! This layer contains:
//! - Repository implementations (in-memory and PostgreSQL)
//! - Telephony adapters
//! - Metrics recording

pub mod metrics;
pub mod persistence;
pub mod telephony;
