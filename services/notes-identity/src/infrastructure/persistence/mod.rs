//! 持久化实现

pub mod memory;
pub mod postgres;

pub use memory::{InMemoryAccountRepository, InMemoryVerificationRepository};
pub use postgres::{PostgresAccountRepository, PostgresVerificationRepository, migrations};
