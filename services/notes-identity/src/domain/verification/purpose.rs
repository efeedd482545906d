//! 验证用途

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::secret;

/// 验证用途
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Purpose {
    /// 注册邮箱验证（6 位数字验证码）
    EmailVerify,
    /// 密码重置（不透明令牌，通过链接发送）
    PasswordReset,
}

impl Purpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EmailVerify => "email_verify",
            Self::PasswordReset => "password_reset",
        }
    }

    /// 按用途生成明文秘密
    pub fn generate_secret(&self) -> String {
        match self {
            Self::EmailVerify => secret::generate_numeric_code(),
            Self::PasswordReset => secret::generate_opaque_token(),
        }
    }
}

impl fmt::Display for Purpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Purpose {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "email_verify" => Ok(Self::EmailVerify),
            "password_reset" => Ok(Self::PasswordReset),
            other => Err(format!("Unknown verification purpose: {}", other)),
        }
    }
}
