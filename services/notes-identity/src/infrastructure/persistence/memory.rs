//! 内存仓储
//!
//! 未配置数据库时及测试中使用。每个操作在单个写锁内完成，
//! 因此替换与条件更新都是原子的。

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use notes_common::AccountId;
use notes_errors::{AppError, AppResult};
use tokio::sync::RwLock;

use crate::domain::account::Account;
use crate::domain::repositories::{AccountRepository, VerificationRepository};
use crate::domain::value_objects::{Email, HashedPassword};
use crate::domain::verification::{Purpose, VerificationRequest, VerificationRequestId};

/// 内存账户仓储
#[derive(Debug, Default)]
pub struct InMemoryAccountRepository {
    accounts: RwLock<HashMap<AccountId, Account>>,
}

impl InMemoryAccountRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountRepository for InMemoryAccountRepository {
    async fn save(&self, account: &Account) -> AppResult<()> {
        let mut accounts = self.accounts.write().await;
        if accounts.values().any(|a| a.email == account.email) {
            return Err(AppError::conflict("Email already registered"));
        }
        accounts.insert(account.id, account.clone());
        Ok(())
    }

    async fn find_by_email(&self, email: &Email) -> AppResult<Option<Account>> {
        Ok(self
            .accounts
            .read()
            .await
            .values()
            .find(|a| &a.email == email)
            .cloned())
    }

    async fn mark_email_verified(&self, id: &AccountId, at: DateTime<Utc>) -> AppResult<()> {
        let mut accounts = self.accounts.write().await;
        let account = accounts
            .get_mut(id)
            .ok_or_else(|| AppError::not_found(format!("Account {} not found", id)))?;
        account.mark_email_verified(at);
        Ok(())
    }

    async fn update_password(
        &self,
        id: &AccountId,
        password_hash: &HashedPassword,
        at: DateTime<Utc>,
    ) -> AppResult<()> {
        let mut accounts = self.accounts.write().await;
        let account = accounts
            .get_mut(id)
            .ok_or_else(|| AppError::not_found(format!("Account {} not found", id)))?;
        account.update_password(password_hash.clone(), at);
        Ok(())
    }
}

/// 内存验证请求仓储
#[derive(Debug, Default)]
pub struct InMemoryVerificationRepository {
    requests: RwLock<HashMap<VerificationRequestId, VerificationRequest>>,
}

impl InMemoryVerificationRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// 当前保存的请求数量（含非待验证状态）
    pub async fn len(&self) -> usize {
        self.requests.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.requests.read().await.is_empty()
    }
}

#[async_trait]
impl VerificationRepository for InMemoryVerificationRepository {
    async fn replace_pending(&self, request: &VerificationRequest) -> AppResult<()> {
        let mut requests = self.requests.write().await;
        requests
            .values_mut()
            .filter(|r| r.account_id == request.account_id && r.purpose == request.purpose)
            .for_each(VerificationRequest::mark_superseded);
        requests.insert(request.id, request.clone());
        Ok(())
    }

    async fn find_pending(
        &self,
        account_id: &AccountId,
        purpose: Purpose,
    ) -> AppResult<Option<VerificationRequest>> {
        Ok(self
            .requests
            .read()
            .await
            .values()
            .find(|r| &r.account_id == account_id && r.purpose == purpose && r.is_pending())
            .cloned())
    }

    async fn record_failed_attempt(
        &self,
        id: &VerificationRequestId,
        max_failed_attempts: u32,
    ) -> AppResult<Option<u32>> {
        let mut requests = self.requests.write().await;
        Ok(requests
            .get_mut(id)
            .filter(|r| r.is_pending() && r.failed_attempts < max_failed_attempts)
            .map(|r| {
                r.failed_attempts += 1;
                r.failed_attempts
            }))
    }

    async fn consume(
        &self,
        id: &VerificationRequestId,
        now: DateTime<Utc>,
        max_failed_attempts: u32,
    ) -> AppResult<bool> {
        let mut requests = self.requests.write().await;
        Ok(requests.get_mut(id).is_some_and(|request| {
            request.failed_attempts < max_failed_attempts && request.mark_consumed(now)
        }))
    }

    async fn delete(&self, id: &VerificationRequestId) -> AppResult<()> {
        self.requests.write().await.remove(id);
        Ok(())
    }

    async fn count_issued_since(
        &self,
        account_id: &AccountId,
        purpose: Purpose,
        since: DateTime<Utc>,
    ) -> AppResult<u64> {
        let count = self
            .requests
            .read()
            .await
            .values()
            .filter(|r| &r.account_id == account_id && r.purpose == purpose && r.issued_at >= since)
            .count();
        Ok(count as u64)
    }

    async fn delete_expired_before(&self, cutoff: DateTime<Utc>) -> AppResult<u64> {
        let mut requests = self.requests.write().await;
        let before = requests.len();
        requests.retain(|_, r| r.expires_at >= cutoff);
        Ok((before - requests.len()) as u64)
    }
}
