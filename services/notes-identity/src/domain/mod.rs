//! 领域层

pub mod account;
pub mod repositories;
pub mod services;
pub mod value_objects;
pub mod verification;
