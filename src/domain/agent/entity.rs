//! Agent entity

use crate::domain::shared::error::DomainError;
use crate::domain::shared::value_objects::AgentId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Agent availability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    /// Free to take the next connected call
    Idle,
    /// Holding a connected call
    Busy,
}

impl AgentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentStatus::Idle => "idle",
            AgentStatus::Busy => "busy",
        }
    }
}

impl FromStr for AgentStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "idle" => Ok(AgentStatus::Idle),
            "busy" => Ok(AgentStatus::Busy),
            _ => Err(DomainError::ValidationError(format!("Unknown agent status: {}", s))),
        }
    }
}

impl fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agent {
    pub id: AgentId,
    pub name: String,
    pub extension: String,
    pub status: AgentStatus,
}

impl Agent {
    pub fn new(name: impl Into<String>, extension: impl Into<String>) -> Self {
        Self {
            id: AgentId::new(),
            name: name.into(),
            extension: extension.into(),
            status: AgentStatus::Idle,
        }
    }

    pub fn is_idle(&self) -> bool {
        self.status == AgentStatus::Idle
    }

    /// Private topic for notifications routed to this agent
    pub fn topic(&self) -> String {
        agent_topic(&self.id)
    }
}

pub fn agent_topic(id: &AgentId) -> String {
    format!("agent.{}", id)
}
