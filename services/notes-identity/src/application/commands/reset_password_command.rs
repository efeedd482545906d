//! 重置密码命令

use notes_cqrs_core::Command;
use serde::{Deserialize, Serialize};

use crate::error::AuthError;

/// 重置密码命令
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetPasswordCommand {
    /// 邮箱
    pub email: String,

    /// 重置令牌
    pub token: String,

    /// 新密码
    pub new_password: String,
}

impl Command for ResetPasswordCommand {
    type Result = ();
    type Error = AuthError;
}
