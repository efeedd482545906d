//! 验证策略

use chrono::Duration;
use notes_config::VerificationConfig;

use super::purpose::Purpose;

/// 有效期与限流参数
#[derive(Debug, Clone)]
pub struct VerificationPolicy {
    pub code_ttl: Duration,
    pub reset_token_ttl: Duration,
    pub max_failed_attempts: u32,
    pub max_issuances_per_hour: u32,
}

impl VerificationPolicy {
    pub fn from_config(config: &VerificationConfig) -> Self {
        Self {
            code_ttl: Duration::minutes(i64::from(config.code_ttl_minutes)),
            reset_token_ttl: Duration::minutes(i64::from(config.reset_token_ttl_minutes)),
            max_failed_attempts: config.max_failed_attempts,
            max_issuances_per_hour: config.max_issuances_per_hour,
        }
    }

    /// 按用途取有效期
    pub fn ttl_for(&self, purpose: Purpose) -> Duration {
        match purpose {
            Purpose::EmailVerify => self.code_ttl,
            Purpose::PasswordReset => self.reset_token_ttl,
        }
    }
}

impl Default for VerificationPolicy {
    fn default() -> Self {
        Self {
            code_ttl: Duration::minutes(10),
            reset_token_ttl: Duration::minutes(60),
            max_failed_attempts: 5,
            max_issuances_per_hour: 5,
        }
    }
}
