//! Persistence implementations

pub mod memory;
#[cfg(feature = "postgres")]
pub mod database;
#[cfg(feature = "postgres")]
pub mod postgres;

pub use memory::InMemoryDialerStore;
#[cfg(feature = "postgres")]
pub use database::{create_pool, run_migrations, PoolConfig};
#[cfg(feature = "postgres")]
pub use postgres::PgDialerStore;
