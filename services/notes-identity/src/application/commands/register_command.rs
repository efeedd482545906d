//! 注册命令

use notes_common::AccountId;
use notes_cqrs_core::Command;
use serde::{Deserialize, Serialize};

use crate::error::AuthError;

/// 注册命令：创建账户并发送邮箱验证码
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterCommand {
    pub email: String,
    pub password: String,
}

impl Command for RegisterCommand {
    type Result = RegisterResult;
    type Error = AuthError;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterResult {
    pub account_id: AccountId,
}
