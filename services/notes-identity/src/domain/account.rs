//! 账户实体

use chrono::{DateTime, Utc};
use notes_common::AccountId;

use super::value_objects::{Email, HashedPassword};

/// 账户
#[derive(Debug, Clone)]
pub struct Account {
    pub id: AccountId,
    pub email: Email,
    pub password_hash: HashedPassword,
    pub email_verified: bool,
    pub email_verified_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// 注册新账户（邮箱未验证）
    pub fn register(email: Email, password_hash: HashedPassword, now: DateTime<Utc>) -> Self {
        Self {
            id: AccountId::new(),
            email,
            password_hash,
            email_verified: false,
            email_verified_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// 标记邮箱已验证，重复调用不改变首次验证时间
    pub fn mark_email_verified(&mut self, now: DateTime<Utc>) {
        if self.email_verified {
            return;
        }
        self.email_verified = true;
        self.email_verified_at = Some(now);
        self.updated_at = now;
    }

    pub fn update_password(&mut self, password_hash: HashedPassword, now: DateTime<Utc>) {
        self.password_hash = password_hash;
        self.updated_at = now;
    }
}
