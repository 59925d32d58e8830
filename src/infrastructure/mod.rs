//! Infrastructure layer - external concerns

pub mod crypto;
pub mod database;
pub mod memory;

pub use database::{init_database, DatabaseConfig};
pub use memory::InMemoryRepositoryProvider;
