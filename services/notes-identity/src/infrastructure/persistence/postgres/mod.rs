//! PostgreSQL 仓储实现

pub mod account_repository;
pub mod migrations;
pub mod verification_repository;

pub use account_repository::PostgresAccountRepository;
pub use verification_repository::PostgresVerificationRepository;
