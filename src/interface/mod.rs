//! Interface layer - External interfaces
//!
//! This layer handles:
//! - REST control surface for dialing
//! - WebSocket notification stream
//! - Prometheus scrape endpoint

pub mod api;
