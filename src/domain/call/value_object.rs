//! Call value objects

use crate::domain::shared::error::DomainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Call status
///
/// ```text
/// pending -> dialing -> ringing -> connected
///                    |          \-> no_agent_available
///                    \-> busy | no_answer | failed | cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallStatus {
    /// Record exists, nothing sent to the carrier yet
    Pending,
    /// Handed to the telephony adapter
    Dialing,
    /// Callee answered, looking for an agent
    Ringing,
    /// Bridged to an agent
    Connected,
    /// Callee line busy
    Busy,
    /// Callee did not pick up
    NoAnswer,
    /// Carrier or network failure
    Failed,
    /// Campaign stopped while dialing
    Cancelled,
    /// Answered but every agent was busy
    NoAgentAvailable,
}

impl CallStatus {
    pub const ALL: [CallStatus; 9] = [
        CallStatus::Pending,
        CallStatus::Dialing,
        CallStatus::Ringing,
        CallStatus::Connected,
        CallStatus::Busy,
        CallStatus::NoAnswer,
        CallStatus::Failed,
        CallStatus::Cancelled,
        CallStatus::NoAgentAvailable,
    ];

    /// Statuses counted as in flight
    pub const ACTIVE: [CallStatus; 3] = [CallStatus::Dialing, CallStatus::Ringing, CallStatus::Connected];

    /// Terminal outcomes other than cancellation
    pub const COMPLETED: [CallStatus; 4] = [
        CallStatus::Busy,
        CallStatus::NoAnswer,
        CallStatus::Failed,
        CallStatus::NoAgentAvailable,
    ];

    /// Check if state transition is valid
    pub fn can_transition_to(&self, next: CallStatus) -> bool {
        use CallStatus::*;

        matches!(
            (self, next),
            (Pending, Dialing)
                | (Pending, Cancelled)
                | (Dialing, Ringing)
                | (Dialing, Busy)
                | (Dialing, NoAnswer)
                | (Dialing, Failed)
                | (Dialing, Cancelled)
                | (Ringing, Connected)
                | (Ringing, NoAgentAvailable)
        )
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, CallStatus::Pending | CallStatus::Dialing | CallStatus::Ringing)
    }

    pub fn is_active(&self) -> bool {
        Self::ACTIVE.contains(self)
    }

    pub fn is_completed(&self) -> bool {
        Self::COMPLETED.contains(self)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CallStatus::Pending => "pending",
            CallStatus::Dialing => "dialing",
            CallStatus::Ringing => "ringing",
            CallStatus::Connected => "connected",
            CallStatus::Busy => "busy",
            CallStatus::NoAnswer => "no_answer",
            CallStatus::Failed => "failed",
            CallStatus::Cancelled => "cancelled",
            CallStatus::NoAgentAvailable => "no_agent_available",
        }
    }
}

impl FromStr for CallStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| DomainError::ValidationError(format!("Unknown call status: {}", s)))
    }
}

impl fmt::Display for CallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the telephony side reports for a dial attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DialOutcome {
    Answered,
    Busy,
    NoAnswer,
    Failed,
}

impl DialOutcome {
    pub const ALL: [DialOutcome; 4] = [
        DialOutcome::Answered,
        DialOutcome::Busy,
        DialOutcome::NoAnswer,
        DialOutcome::Failed,
    ];

    /// Final status for outcomes that end the call right away
    pub fn terminal_status(&self) -> Option<CallStatus> {
        match self {
            DialOutcome::Answered => None,
            DialOutcome::Busy => Some(CallStatus::Busy),
            DialOutcome::NoAnswer => Some(CallStatus::NoAnswer),
            DialOutcome::Failed => Some(CallStatus::Failed),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DialOutcome::Answered => "answered",
            DialOutcome::Busy => "busy",
            DialOutcome::NoAnswer => "no_answer",
            DialOutcome::Failed => "failed",
        }
    }
}

impl fmt::Display for DialOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
