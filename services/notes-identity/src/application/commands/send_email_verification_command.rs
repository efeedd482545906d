//! 发送邮箱验证码命令

use notes_cqrs_core::Command;
use serde::{Deserialize, Serialize};

use crate::error::AuthError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendEmailVerificationCommand {
    pub email: String,
}

impl Command for SendEmailVerificationCommand {
    type Result = ();
    type Error = AuthError;
}
