//! 登录命令

use notes_common::AccountId;
use notes_cqrs_core::Command;
use serde::{Deserialize, Serialize};

use crate::error::AuthError;

/// 登录命令
///
/// 只校验凭据，不签发会话。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginCommand {
    pub email: String,
    pub password: String,
}

impl Command for LoginCommand {
    type Result = LoginResult;
    type Error = AuthError;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResult {
    pub account_id: AccountId,
    pub email_verified: bool,
}
