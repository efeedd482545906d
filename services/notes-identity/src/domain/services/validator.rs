//! 验证码 / 令牌校验服务

use std::sync::Arc;

use chrono::{DateTime, Utc};
use notes_common::Clock;
use tracing::{debug, info, warn};

use crate::domain::account::Account;
use crate::domain::repositories::{AccountRepository, VerificationRepository};
use crate::domain::value_objects::Email;
use crate::domain::verification::{
    Purpose, VerificationFailure, VerificationPolicy, VerificationRequest,
};
use crate::error::AuthError;

/// 校验模式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationMode {
    /// 只读检查，不改变任何状态
    Peek,
    /// 校验通过后原子地标记为已使用
    Consume,
}

/// 校验通过的结果
#[derive(Debug, Clone)]
pub struct Verified {
    pub account: Account,
    pub request: VerificationRequest,
}

/// 校验服务
pub struct Validator {
    accounts: Arc<dyn AccountRepository>,
    verifications: Arc<dyn VerificationRepository>,
    clock: Arc<dyn Clock>,
    policy: VerificationPolicy,
}

impl Validator {
    pub fn new(
        accounts: Arc<dyn AccountRepository>,
        verifications: Arc<dyn VerificationRepository>,
        clock: Arc<dyn Clock>,
        policy: VerificationPolicy,
    ) -> Self {
        Self {
            accounts,
            verifications,
            clock,
            policy,
        }
    }

    /// 校验候选值
    ///
    /// 判定顺序：无待验证请求 → 过期 → 尝试次数耗尽 → 不匹配。
    /// 未知邮箱同样返回 `NotFound`。
    pub async fn verify(
        &self,
        email: &Email,
        purpose: Purpose,
        candidate: &str,
        mode: ValidationMode,
    ) -> Result<Verified, AuthError> {
        let Some(account) = self.accounts.find_by_email(email).await? else {
            debug!(purpose = %purpose, "Validation for unknown account");
            return Err(AuthError::NotFound);
        };

        let Some(mut request) = self
            .verifications
            .find_pending(&account.id, purpose)
            .await?
        else {
            debug!(account_id = %account.id, purpose = %purpose, "No pending verification request");
            return Err(AuthError::NotFound);
        };

        let now = self.clock.now();
        let max_failed_attempts = self.policy.max_failed_attempts;
        match request.evaluate(candidate, now, max_failed_attempts) {
            Ok(()) => {}
            Err(VerificationFailure::Mismatch) => {
                // 快照可能已过时，以仓储的条件更新为准
                let Some(failed_attempts) = self
                    .verifications
                    .record_failed_attempt(&request.id, max_failed_attempts)
                    .await?
                else {
                    return Err(self.settled_failure(&request, candidate, now).await?);
                };
                warn!(
                    account_id = %account.id,
                    request_id = %request.id,
                    purpose = %purpose,
                    failed_attempts,
                    "Verification secret mismatch"
                );
                return Err(AuthError::Mismatch);
            }
            Err(failure) => {
                debug!(request_id = %request.id, ?failure, "Verification rejected");
                return Err(failure.into());
            }
        }

        if mode == ValidationMode::Consume {
            if !self
                .verifications
                .consume(&request.id, now, max_failed_attempts)
                .await?
            {
                warn!(request_id = %request.id, "Verification request changed concurrently");
                return Err(self.settled_failure(&request, candidate, now).await?);
            }
            request.mark_consumed(now);
            info!(
                account_id = %account.id,
                request_id = %request.id,
                purpose = %purpose,
                "Verification request consumed"
            );
        }

        Ok(Verified { account, request })
    }

    /// 条件更新落空后，按请求的当前状态给出拒绝原因
    async fn settled_failure(
        &self,
        request: &VerificationRequest,
        candidate: &str,
        now: DateTime<Utc>,
    ) -> Result<AuthError, AuthError> {
        let current = self
            .verifications
            .find_pending(&request.account_id, request.purpose)
            .await?
            .filter(|current| current.id == request.id);

        Ok(
            match current.map(|r| r.evaluate(candidate, now, self.policy.max_failed_attempts)) {
                Some(Err(VerificationFailure::Expired)) => AuthError::Expired,
                Some(Err(VerificationFailure::TooManyAttempts)) => AuthError::TooManyAttempts,
                _ => AuthError::NotFound,
            },
        )
    }
}
