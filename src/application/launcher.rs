//! Hand-off of created calls to telephony

use crate::application::outcome_reporter::OutcomeReporter;
use crate::domain::call::DialOutcome;
use crate::domain::telephony::{DialRequest, TelephonyAdapter};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;
use tracing::{error, warn};

/// Starts a created call without waiting for its outcome
#[cfg_attr(test, mockall::automock)]
pub trait CallLauncher: Send + Sync {
    fn launch(&self, request: DialRequest);
}

/// Places each call on its own task and feeds the outcome to the reporter
///
/// An adapter error is reported as a `failed` outcome so the call never
/// stays in `dialing`.
pub struct TelephonyLauncher {
    adapter: Arc<dyn TelephonyAdapter>,
    reporter: Arc<OutcomeReporter>,
    in_flight: Arc<InFlight>,
}

#[derive(Default)]
struct InFlight {
    count: AtomicUsize,
    drained: Notify,
}

impl InFlight {
    fn enter(&self) {
        self.count.fetch_add(1, Ordering::SeqCst);
    }

    fn leave(&self) {
        if self.count.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.drained.notify_waiters();
        }
    }
}

impl TelephonyLauncher {
    pub fn new(adapter: Arc<dyn TelephonyAdapter>, reporter: Arc<OutcomeReporter>) -> Self {
        Self {
            adapter,
            reporter,
            in_flight: Arc::new(InFlight::default()),
        }
    }

    /// Calls placed whose outcome has not been applied yet
    pub fn in_flight(&self) -> usize {
        self.in_flight.count.load(Ordering::SeqCst)
    }

    /// Wait until every launched call has had its outcome applied
    pub async fn drain(&self) {
        loop {
            let drained = self.in_flight.drained.notified();
            tokio::pin!(drained);
            drained.as_mut().enable();

            if self.in_flight() == 0 {
                return;
            }
            drained.await;
        }
    }
}

impl CallLauncher for TelephonyLauncher {
    fn launch(&self, request: DialRequest) {
        let adapter = Arc::clone(&self.adapter);
        let reporter = Arc::clone(&self.reporter);
        let in_flight = Arc::clone(&self.in_flight);
        in_flight.enter();

        tokio::spawn(async move {
            let outcome = match adapter.place_call(&request).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    warn!(call_id = %request.call_id, error = %e, "Telephony adapter failed");
                    DialOutcome::Failed
                }
            };

            if let Err(e) = reporter.report(&request.call_id, outcome).await {
                error!(call_id = %request.call_id, outcome = %outcome, error = %e, "Failed to report call outcome");
            }

            in_flight.leave();
        });
    }
}
