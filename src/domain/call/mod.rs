//! Call bounded context - one record per dial attempt

pub mod aggregate;
pub mod repository;
pub mod value_object;

pub use aggregate::Call;
pub use repository::{CallRepository, CallStatusCount};
pub use value_object::{CallStatus, DialOutcome};
