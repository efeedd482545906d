//! 令牌签发服务

use std::fmt;
use std::sync::Arc;

use chrono::Duration;
use notes_common::Clock;
use notes_errors::AppResult;
use tracing::{debug, info, warn};

use crate::domain::account::Account;
use crate::domain::repositories::{AccountRepository, VerificationRepository};
use crate::domain::value_objects::Email;
use crate::domain::verification::{Purpose, VerificationPolicy, VerificationRequest};
use crate::error::AuthError;

/// 签发结果
///
/// `secret` 是明文，只能交给通知器投递，不得写入日志或响应。
pub struct IssuedVerification {
    pub request: VerificationRequest,
    pub secret: String,
}

impl fmt::Debug for IssuedVerification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IssuedVerification")
            .field("request", &self.request)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

/// 令牌签发服务
pub struct TokenIssuer {
    accounts: Arc<dyn AccountRepository>,
    verifications: Arc<dyn VerificationRepository>,
    clock: Arc<dyn Clock>,
    policy: VerificationPolicy,
}

impl TokenIssuer {
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

    pub fn policy(&self) -> &VerificationPolicy {
        &self.policy
    }

    /// 按邮箱解析账户后签发
    pub async fn issue_for_email(
        &self,
        email: &Email,
        purpose: Purpose,
    ) -> Result<IssuedVerification, AuthError> {
        let account = self.accounts.find_by_email(email).await?.ok_or_else(|| {
            debug!(purpose = %purpose, "Issuance requested for unknown account");
            AuthError::UnknownAccount
        })?;

        self.issue(&account, purpose).await
    }

    /// 为已解析的账户签发新的验证请求，并取代之前的待验证请求
    pub async fn issue(
        &self,
        account: &Account,
        purpose: Purpose,
    ) -> Result<IssuedVerification, AuthError> {
        if purpose == Purpose::EmailVerify && account.email_verified {
            return Err(AuthError::AlreadyVerified);
        }

        let now = self.clock.now();
        let issued_last_hour = self
            .verifications
            .count_issued_since(&account.id, purpose, now - Duration::hours(1))
            .await?;

        if issued_last_hour >= u64::from(self.policy.max_issuances_per_hour) {
            warn!(
                account_id = %account.id,
                purpose = %purpose,
                issued_last_hour,
                "Verification issuance throttled"
            );
            return Err(AuthError::RateLimited);
        }

        let secret = purpose.generate_secret();
        let request = VerificationRequest::issue(
            account.id,
            account.email.clone(),
            purpose,
            &secret,
            now,
            self.policy.ttl_for(purpose),
        );

        self.verifications.replace_pending(&request).await?;

        info!(
            account_id = %account.id,
            request_id = %request.id,
            purpose = %purpose,
            expires_at = %request.expires_at,
            "Verification request issued"
        );

        Ok(IssuedVerification { request, secret })
    }

    /// 撤销一次未完成的签发
    pub async fn revoke(&self, request: &VerificationRequest) -> AppResult<()> {
        self.verifications.delete(&request.id).await?;
        info!(request_id = %request.id, purpose = %request.purpose, "Verification request revoked");
        Ok(())
    }
}
