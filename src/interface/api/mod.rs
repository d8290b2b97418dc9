//! API interface implementations

pub mod agent_handler;
pub mod dialing_handler;
pub mod dto;
pub mod metrics_handler;
pub mod router;
pub mod websocket;

pub use dialing_handler::AppState;
pub use dto::ApiResponse;
pub use metrics_handler::init_metrics;
pub use router::build_router;
pub use websocket::{EventBroadcaster, PublishedEvent};
