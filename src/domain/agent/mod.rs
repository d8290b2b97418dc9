//! Agent bounded context - availability of the humans answering connected calls

pub mod entity;
pub mod pool;
pub mod repository;

pub use entity::{agent_topic, Agent, AgentStatus};
pub use pool::AgentPool;
pub use repository::AgentRepository;
