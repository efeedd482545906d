//! 请求密码重置命令

use notes_cqrs_core::Command;
use serde::{Deserialize, Serialize};

use crate::error::AuthError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestPasswordResetCommand {
    pub email: String,
}

impl Command for RequestPasswordResetCommand {
    type Result = ();
    type Error = AuthError;
}
