//! 签发 + 投递编排
//!
//! 每次签发恰好投递一封邮件。严格模式下投递失败会撤销刚插入的请求，
//! 宽松模式下只记录告警。

use std::sync::Arc;

use tracing::warn;

use crate::domain::account::Account;
use crate::domain::services::{DeliveryPolicy, IssuedVerification, Notifier, TokenIssuer};
use crate::domain::value_objects::Email;
use crate::domain::verification::Purpose;
use crate::error::AuthError;
use crate::infrastructure::metrics;

pub struct VerificationDispatcher {
    issuer: Arc<TokenIssuer>,
    notifier: Arc<dyn Notifier>,
    delivery: DeliveryPolicy,
}

impl VerificationDispatcher {
    pub fn new(
        issuer: Arc<TokenIssuer>,
        notifier: Arc<dyn Notifier>,
        delivery: DeliveryPolicy,
    ) -> Self {
        Self {
            issuer,
            notifier,
            delivery,
        }
    }

    /// 为已解析的账户签发并投递
    pub async fn dispatch(&self, account: &Account, purpose: Purpose) -> Result<(), AuthError> {
        let issued = self.issuer.issue(account, purpose).await?;
        self.deliver(issued).await
    }

    /// 按邮箱解析账户后签发并投递
    pub async fn dispatch_to_email(&self, email: &Email, purpose: Purpose) -> Result<(), AuthError> {
        let issued = self.issuer.issue_for_email(email, purpose).await?;
        self.deliver(issued).await
    }

    async fn deliver(&self, issued: IssuedVerification) -> Result<(), AuthError> {
        let request = &issued.request;
        let ttl = self.issuer.policy().ttl_for(request.purpose);

        let result = self
            .notifier
            .notify(&request.email, request.purpose, &issued.secret, ttl)
            .await;

        let Err(e) = result else {
            metrics::record_issued(request.purpose);
            return Ok(());
        };

        match self.delivery {
            DeliveryPolicy::Strict => {
                if let Err(revoke_err) = self.issuer.revoke(request).await {
                    warn!(
                        request_id = %request.id,
                        error = %revoke_err,
                        "Failed to revoke undelivered verification request"
                    );
                }
                Err(AuthError::TransportFailure(e.to_string()))
            }
            DeliveryPolicy::Lenient => {
                warn!(
                    request_id = %request.id,
                    purpose = %request.purpose,
                    error = %e,
                    "Delivery failed, continuing under lenient delivery policy"
                );
                metrics::record_issued(request.purpose);
                Ok(())
            }
        }
    }
}
