//! 应用层

pub mod commands;
pub mod dispatcher;
pub mod handlers;
pub mod queries;

pub use dispatcher::VerificationDispatcher;
