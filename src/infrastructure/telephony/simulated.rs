//! Simulated telephony adapter
//!
//! Stands in for a real carrier: waits a random delay, then reports an
//! outcome drawn from configurable weights.

use crate::config::{OutcomeWeights, TelephonyConfig};
use crate::domain::call::DialOutcome;
use crate::domain::shared::error::DomainError;
use crate::domain::shared::random::RandomSource;
use crate::domain::shared::result::Result;
use crate::domain::telephony::{DialRequest, TelephonyAdapter};
use async_trait::async_trait;
use rand::distributions::WeightedIndex;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

pub struct SimulatedTelephony {
    rng: Arc<RandomSource>,
    outcomes: WeightedIndex<u32>,
    min_delay_ms: u64,
    max_delay_ms: u64,
}

impl SimulatedTelephony {
    pub fn new(config: &TelephonyConfig, rng: Arc<RandomSource>) -> Result<Self> {
        let outcomes = weighted_outcomes(&config.weights)?;

        Ok(Self {
            rng,
            outcomes,
            min_delay_ms: config.min_delay_ms,
            max_delay_ms: config.max_delay_ms.max(config.min_delay_ms),
        })
    }

    pub fn from_config(config: &TelephonyConfig) -> Result<Self> {
        Self::new(config, Arc::new(RandomSource::from_optional_seed(config.seed)))
    }
}

/// Weights in `DialOutcome::ALL` order
fn weighted_outcomes(weights: &OutcomeWeights) -> Result<WeightedIndex<u32>> {
    let values = DialOutcome::ALL.map(|outcome| match outcome {
        DialOutcome::Answered => weights.answered,
        DialOutcome::Busy => weights.busy,
        DialOutcome::NoAnswer => weights.no_answer,
        DialOutcome::Failed => weights.failed,
    });

    WeightedIndex::new(values)
        .map_err(|e| DomainError::ValidationError(format!("Invalid outcome weights: {}", e)))
}

#[async_trait]
impl TelephonyAdapter for SimulatedTelephony {
    async fn place_call(&self, request: &DialRequest) -> Result<DialOutcome> {
        let delay = self.rng.between(self.min_delay_ms, self.max_delay_ms).await;
        debug!(
            call_id = %request.call_id,
            destination = %request.destination,
            caller_id = %request.caller_id_number,
            delay_ms = delay,
            "Simulating call"
        );

        tokio::time::sleep(Duration::from_millis(delay)).await;

        let outcome = DialOutcome::ALL[self.rng.weighted(&self.outcomes).await];
        debug!(call_id = %request.call_id, outcome = %outcome, "Simulated call finished");

        Ok(outcome)
    }
}
