//! notes-identity - Web Notes 账户验证服务
//!
//! 注册验证码、登录凭据校验、密码重置令牌的签发、投递与校验。

pub mod api;
pub mod application;
pub mod composition;
pub mod domain;
pub mod error;
pub mod infrastructure;

pub use composition::{ServiceDeps, build_state, select_email_sender};
pub use error::AuthError;
