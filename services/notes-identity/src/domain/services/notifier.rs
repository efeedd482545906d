//! 通知接口

use async_trait::async_trait;
use chrono::Duration;
use notes_errors::AppResult;

use crate::domain::value_objects::Email;
use crate::domain::verification::Purpose;

/// 投递失败时的处理策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryPolicy {
    /// 投递失败即签发失败，请求被撤销
    Strict,
    /// 投递失败只记录告警，仍视为成功
    Lenient,
}

impl DeliveryPolicy {
    /// 生产环境严格，其它环境宽松
    pub fn for_environment(is_production: bool) -> Self {
        if is_production {
            Self::Strict
        } else {
            Self::Lenient
        }
    }
}

/// 通知器：把明文秘密送达账户邮箱，每次签发恰好一封邮件
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(
        &self,
        email: &Email,
        purpose: Purpose,
        secret: &str,
        ttl: Duration,
    ) -> AppResult<()>;
}
