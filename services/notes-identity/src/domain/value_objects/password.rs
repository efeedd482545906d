//! Password 值对象
//!
//! 密码策略：长度 8-128，至少包含小写、大写、数字、特殊字符中的三类，
//! 且不在常见弱密码列表中。哈希使用 Argon2。

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use serde::{Deserialize, Serialize};
use std::fmt;

const MIN_LENGTH: usize = 8;
const MAX_LENGTH: usize = 128;
const MIN_COMPLEXITY_TYPES: usize = 3;

/// 常见弱密码
const COMMON_PASSWORDS: &[&str] = &[
    "password",
    "password1",
    "password123",
    "passw0rd",
    "p@ssw0rd",
    "12345678",
    "123456789",
    "qwerty123",
    "qwertyuiop",
    "iloveyou",
    "sunshine1",
    "letmein1",
    "welcome1",
    "admin123",
    "trustno1",
    "football1",
];

/// 哈希后的密码（PHC 字符串）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashedPassword(String);

impl HashedPassword {
    /// 校验策略后哈希明文密码
    pub fn from_plain(plain_password: &str) -> Result<Self, PasswordError> {
        Password::validate(plain_password)?;

        let salt = SaltString::generate(&mut OsRng);
        let password_hash = Argon2::default()
            .hash_password(plain_password.as_bytes(), &salt)
            .map_err(|e| PasswordError::HashingFailed(e.to_string()))?
            .to_string();

        Ok(Self(password_hash))
    }

    /// 验证明文密码是否匹配
    pub fn verify(&self, plain_password: &str) -> Result<bool, PasswordError> {
        let parsed_hash =
            PasswordHash::new(&self.0).map_err(|e| PasswordError::InvalidHash(e.to_string()))?;

        Ok(Argon2::default()
            .verify_password(plain_password.as_bytes(), &parsed_hash)
            .is_ok())
    }

    /// 从已有的哈希字符串创建
    pub fn from_hash(hash: String) -> Self {
        Self(hash)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HashedPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

/// 明文密码策略
pub struct Password;

impl Password {
    /// 校验密码强度
    pub fn validate(password: &str) -> Result<(), PasswordError> {
        let length = password.chars().count();
        if length < MIN_LENGTH {
            return Err(PasswordError::TooShort(MIN_LENGTH));
        }
        if length > MAX_LENGTH {
            return Err(PasswordError::TooLong(MAX_LENGTH));
        }

        let lowercase = password.to_lowercase();
        if COMMON_PASSWORDS.contains(&lowercase.as_str()) {
            return Err(PasswordError::TooCommon);
        }

        let has_lowercase = password.chars().any(|c| c.is_lowercase());
        let has_uppercase = password.chars().any(|c| c.is_uppercase());
        let has_digit = password.chars().any(|c| c.is_numeric());
        let has_special = password.chars().any(|c| !c.is_alphanumeric());

        let complexity_count = [has_lowercase, has_uppercase, has_digit, has_special]
            .iter()
            .filter(|&&x| x)
            .count();

        if complexity_count < MIN_COMPLEXITY_TYPES {
            return Err(PasswordError::TooSimple);
        }

        Ok(())
    }
}

/// Password 错误
#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("Password is too short (minimum {0} characters)")]
    TooShort(usize),

    #[error("Password is too long (maximum {0} characters)")]
    TooLong(usize),

    #[error("Password must mix at least three of: lowercase, uppercase, digits, symbols")]
    TooSimple,

    #[error("Password is too common")]
    TooCommon,

    #[error("Password hashing failed: {0}")]
    HashingFailed(String),

    #[error("Stored password hash is invalid: {0}")]
    InvalidHash(String),
}
