//! 验证请求仓储接口
//!
//! 仓储是唯一的并发控制点：替换、使用、失败计数都必须是原子操作。

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use notes_common::AccountId;
use notes_errors::AppResult;

use crate::domain::verification::{Purpose, VerificationRequest, VerificationRequestId};

/// 验证请求仓储接口
#[async_trait]
pub trait VerificationRepository: Send + Sync {
    /// 将同一账户同一用途的待验证请求标记为已取代，并插入新请求
    async fn replace_pending(&self, request: &VerificationRequest) -> AppResult<()>;

    /// 查找待验证请求
    async fn find_pending(
        &self,
        account_id: &AccountId,
        purpose: Purpose,
    ) -> AppResult<Option<VerificationRequest>>;

    /// 在尝试预算内将失败次数加一，返回新的计数
    ///
    /// 请求已不再待验证或预算已耗尽时返回 `None`，计数保持不变。
    async fn record_failed_attempt(
        &self,
        id: &VerificationRequestId,
        max_failed_attempts: u32,
    ) -> AppResult<Option<u32>>;

    /// 条件更新为已使用；仅当请求仍待验证、未过期且预算未耗尽时返回 true
    async fn consume(
        &self,
        id: &VerificationRequestId,
        now: DateTime<Utc>,
        max_failed_attempts: u32,
    ) -> AppResult<bool>;

    async fn delete(&self, id: &VerificationRequestId) -> AppResult<()>;

    /// 统计某时间点之后签发的请求数（含已取代、已使用）
    async fn count_issued_since(
        &self,
        account_id: &AccountId,
        purpose: Purpose,
        since: DateTime<Utc>,
    ) -> AppResult<u64>;

    /// 删除在某时间点之前已过期的请求，返回删除数量
    async fn delete_expired_before(&self, cutoff: DateTime<Utc>) -> AppResult<u64>;
}
