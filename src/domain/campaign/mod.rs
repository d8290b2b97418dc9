//! Campaign bounded context

pub mod entity;
pub mod repository;

pub use entity::Campaign;
pub use repository::CampaignRepository;
