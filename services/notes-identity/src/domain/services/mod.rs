//! 领域服务

pub mod notifier;
pub mod token_issuer;
pub mod validator;

pub use notifier::*;
pub use token_issuer::*;
pub use validator::*;
