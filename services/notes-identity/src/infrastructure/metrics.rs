//! 验证流程业务指标

use metrics::counter;

use crate::domain::verification::Purpose;
use crate::error::AuthError;

/// 记录一次签发
pub fn record_issued(purpose: Purpose) {
    counter!("notes_verification_issued_total", "purpose" => purpose.as_str()).increment(1);
}

/// 记录一次校验结果
pub fn record_validation<T>(purpose: Purpose, result: &Result<T, AuthError>) {
    let outcome = match result {
        Ok(_) => "success",
        Err(AuthError::NotFound) => "not_found",
        Err(AuthError::Expired) => "expired",
        Err(AuthError::Mismatch) => "mismatch",
        Err(AuthError::TooManyAttempts) => "too_many_attempts",
        Err(_) => "error",
    };

    counter!(
        "notes_verification_validated_total",
        "purpose" => purpose.as_str(),
        "outcome" => outcome
    )
    .increment(1);
}

/// 记录一次邮件投递
pub fn record_delivery(success: bool) {
    let outcome = if success { "sent" } else { "failed" };
    counter!("notes_email_delivery_total", "outcome" => outcome).increment(1);
}
