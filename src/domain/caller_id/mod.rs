//! Outbound caller-id numbers

pub mod entity;
pub mod repository;
pub mod selector;

pub use entity::CallerId;
pub use repository::CallerIdRepository;
pub use selector::CallerIdSelector;
