//! 检查重置令牌查询

use notes_cqrs_core::Query;
use serde::{Deserialize, Serialize};

use crate::error::AuthError;

/// 只读检查重置链接是否仍然有效，不消耗令牌
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckResetTokenQuery {
    pub email: String,
    pub token: String,
}

impl Query for CheckResetTokenQuery {
    type Result = ();
    type Error = AuthError;
}
