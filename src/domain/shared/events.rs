//! Domain events infrastructure

use chrono::{DateTime, Utc};

/// Base trait for all domain events
pub trait DomainEvent: Send + Sync {
    /// Returns the event type name
    fn event_type(&self) -> &'static str;

    /// Returns when the event occurred
    fn occurred_at(&self) -> DateTime<Utc>;

    /// Topics the event is delivered to
    fn topics(&self) -> Vec<String>;
}
