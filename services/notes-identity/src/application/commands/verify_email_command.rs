//! 验证邮箱命令

use notes_cqrs_core::Command;
use serde::{Deserialize, Serialize};

use crate::error::AuthError;

/// 验证邮箱命令
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyEmailCommand {
    /// 邮箱
    pub email: String,
    /// 验证码
    pub code: String,
}

impl Command for VerifyEmailCommand {
    type Result = ();
    type Error = AuthError;
}
