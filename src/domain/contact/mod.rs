//! Contact bounded context - the people a campaign dials

pub mod entity;
pub mod ledger;
pub mod repository;

pub use entity::Contact;
pub use ledger::ContactLedger;
pub use repository::ContactRepository;
