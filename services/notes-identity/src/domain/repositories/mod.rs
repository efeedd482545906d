//! 仓储接口

pub mod account_repository;
pub mod verification_repository;

pub use account_repository::*;
pub use verification_repository::*;
