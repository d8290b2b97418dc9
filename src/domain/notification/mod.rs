//! Outgoing notifications - value payloads handed to a [`Notifier`]

pub mod event;

pub use event::{CallRouted, DialingStarted, RoutedAgent, RoutedContact, PREDICTIVE_DIALING_TOPIC};

use crate::domain::shared::error::DomainError;
use crate::domain::shared::events::DomainEvent;
use crate::domain::shared::result::Result;
use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;

/// Publish/subscribe fan-out port
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn publish(&self, topic: &str, event_name: &str, payload: serde_json::Value) -> Result<()>;
}

/// Serialize `event` once and publish it on each of its topics
pub async fn publish_event<E>(notifier: &dyn Notifier, event: &E) -> Result<()>
where
    E: DomainEvent + Serialize,
{
    let payload = serde_json::to_value(event)
        .map_err(|e| DomainError::Notification(format!("Failed to encode {}: {}", event.event_type(), e)))?;

    let topics = event.topics();
    debug!(
        event = event.event_type(),
        occurred_at = %event.occurred_at(),
        topics = topics.len(),
        "Publishing event"
    );

    for topic in topics {
        notifier.publish(&topic, event.event_type(), payload.clone()).await?;
    }

    Ok(())
}
