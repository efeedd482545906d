//! 服务错误定义

use notes_errors::AppError;
use thiserror::Error;

use crate::domain::value_objects::{EmailError, PasswordError};
use crate::domain::verification::VerificationFailure;

/// 认证 / 验证流程错误
///
/// `code()` 是返回给前端的稳定错误码，前端据此选择提示文案。
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("No account is registered for this email")]
    UnknownAccount,

    #[error("No pending verification request")]
    NotFound,

    #[error("Verification request has expired")]
    Expired,

    #[error("Verification code does not match")]
    Mismatch,

    #[error("Too many failed attempts for this verification request")]
    TooManyAttempts,

    #[error("Notification could not be delivered: {0}")]
    TransportFailure(String),

    #[error("Too many verification requests, try again later")]
    RateLimited,

    #[error("Email address is already verified")]
    AlreadyVerified,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Email address has not been verified")]
    EmailNotVerified,

    #[error("Email address is already registered")]
    EmailInUse,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Infrastructure(#[from] AppError),
}

impl AuthError {
    /// 错误码
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnknownAccount => "UNKNOWN_ACCOUNT",
            Self::NotFound => "CODE_NOT_FOUND",
            Self::Expired => "CODE_EXPIRED",
            Self::Mismatch => "INVALID_CODE",
            Self::TooManyAttempts => "TOO_MANY_ATTEMPTS",
            Self::TransportFailure(_) => "DELIVERY_FAILED",
            Self::RateLimited => "RATE_LIMITED",
            Self::AlreadyVerified => "ALREADY_VERIFIED",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::EmailNotVerified => "EMAIL_NOT_VERIFIED",
            Self::EmailInUse => "EMAIL_IN_USE",
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::Infrastructure(_) => "INTERNAL_ERROR",
        }
    }

    /// HTTP 状态码
    pub fn status_code(&self) -> u16 {
        match self {
            Self::UnknownAccount => 404,
            Self::NotFound | Self::Mismatch | Self::InvalidInput(_) => 400,
            Self::InvalidCredentials => 401,
            Self::EmailNotVerified => 403,
            Self::AlreadyVerified | Self::EmailInUse => 409,
            Self::Expired => 410,
            Self::TooManyAttempts | Self::RateLimited => 429,
            Self::TransportFailure(_) => 502,
            Self::Infrastructure(e) => e.status_code(),
        }
    }
}

impl From<VerificationFailure> for AuthError {
    fn from(failure: VerificationFailure) -> Self {
        match failure {
            VerificationFailure::NotFound => AuthError::NotFound,
            VerificationFailure::Expired => AuthError::Expired,
            VerificationFailure::TooManyAttempts => AuthError::TooManyAttempts,
            VerificationFailure::Mismatch => AuthError::Mismatch,
        }
    }
}

impl From<EmailError> for AuthError {
    fn from(error: EmailError) -> Self {
        AuthError::InvalidInput(error.to_string())
    }
}

impl From<PasswordError> for AuthError {
    fn from(error: PasswordError) -> Self {
        match error {
            PasswordError::HashingFailed(_) | PasswordError::InvalidHash(_) => {
                AuthError::Infrastructure(AppError::internal(error.to_string()))
            }
            other => AuthError::InvalidInput(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_stable() {
        assert_eq!(AuthError::Mismatch.code(), "INVALID_CODE");
        assert_eq!(AuthError::Expired.code(), "CODE_EXPIRED");
        assert_eq!(AuthError::NotFound.code(), "CODE_NOT_FOUND");
        assert_eq!(
            AuthError::TransportFailure("smtp down".into()).code(),
            "DELIVERY_FAILED"
        );
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(AuthError::Expired.status_code(), 410);
        assert_eq!(AuthError::Mismatch.status_code(), 400);
        assert_eq!(AuthError::TooManyAttempts.status_code(), 429);
        assert_eq!(AuthError::InvalidCredentials.status_code(), 401);
        assert_eq!(AuthError::EmailNotVerified.status_code(), 403);
        assert_eq!(AuthError::TransportFailure("x".into()).status_code(), 502);
        assert_eq!(
            AuthError::Infrastructure(AppError::database("boom")).status_code(),
            500
        );
    }

    #[test]
    fn test_hashing_failure_is_not_user_input() {
        let err: AuthError = PasswordError::HashingFailed("oom".into()).into();
        assert!(matches!(err, AuthError::Infrastructure(_)));

        let err: AuthError = PasswordError::TooShort(8).into();
        assert!(matches!(err, AuthError::InvalidInput(_)));
    }
}
