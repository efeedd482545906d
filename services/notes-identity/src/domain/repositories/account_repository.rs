//! 账户仓储接口

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use notes_common::AccountId;
use notes_errors::AppResult;

use crate::domain::account::Account;
use crate::domain::value_objects::{Email, HashedPassword};

/// 账户仓储接口
#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// 保存新账户，邮箱已存在时返回 `AppError::Conflict`
    async fn save(&self, account: &Account) -> AppResult<()>;

    async fn find_by_email(&self, email: &Email) -> AppResult<Option<Account>>;

    /// 标记邮箱已验证，已验证的账户保留首次验证时间
    async fn mark_email_verified(&self, id: &AccountId, at: DateTime<Utc>) -> AppResult<()>;

    /// 只更新密码哈希，其余字段保持不变
    async fn update_password(
        &self,
        id: &AccountId,
        password_hash: &HashedPassword,
        at: DateTime<Utc>,
    ) -> AppResult<()>;
}
