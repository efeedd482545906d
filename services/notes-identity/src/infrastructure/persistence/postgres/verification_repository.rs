//! PostgreSQL 验证请求仓储实现

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use notes_common::AccountId;
use notes_errors::{AppError, AppResult};
use sqlx::PgPool;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::domain::repositories::VerificationRepository;
use crate::domain::value_objects::Email;
use crate::domain::verification::{
    Purpose, VerificationRequest, VerificationRequestId, VerificationStatus,
};

#[derive(sqlx::FromRow)]
struct VerificationRow {
    id: Uuid,
    account_id: Uuid,
    email: String,
    purpose: String,
    secret_hash: String,
    issued_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    status: String,
    consumed_at: Option<DateTime<Utc>>,
    failed_attempts: i32,
}

impl TryFrom<VerificationRow> for VerificationRequest {
    type Error = AppError;

    fn try_from(row: VerificationRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: VerificationRequestId::from_uuid(row.id),
            account_id: AccountId::from_uuid(row.account_id),
            email: Email::from_trusted(row.email),
            purpose: row.purpose.parse::<Purpose>().map_err(AppError::database)?,
            secret_hash: row.secret_hash,
            issued_at: row.issued_at,
            expires_at: row.expires_at,
            status: row
                .status
                .parse::<VerificationStatus>()
                .map_err(AppError::database)?,
            consumed_at: row.consumed_at,
            failed_attempts: u32::try_from(row.failed_attempts).unwrap_or(0),
        })
    }
}

fn issuance_lock_key(account_id: &AccountId, purpose: Purpose) -> String {
    format!("verification:{}:{}", account_id, purpose.as_str())
}

fn attempt_budget(max_failed_attempts: u32) -> i32 {
    i32::try_from(max_failed_attempts).unwrap_or(i32::MAX)
}

/// PostgreSQL 验证请求仓储
pub struct PostgresVerificationRepository {
    pool: PgPool,
}

impl PostgresVerificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VerificationRepository for PostgresVerificationRepository {
    async fn replace_pending(&self, request: &VerificationRequest) -> AppResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::database(format!("Failed to begin transaction: {}", e)))?;

        // 同一账户同一用途的签发串行执行，锁随事务结束释放
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
            .bind(issuance_lock_key(&request.account_id, request.purpose))
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::database(format!("Failed to acquire issuance lock: {}", e)))?;

        let superseded = sqlx::query(
            r#"
            UPDATE verification_requests
            SET status = 'superseded'
            WHERE account_id = $1 AND purpose = $2 AND status = 'pending'
            "#,
        )
        .bind(request.account_id.0)
        .bind(request.purpose.as_str())
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::database(format!("Failed to supersede requests: {}", e)))?;

        sqlx::query(
            r#"
            INSERT INTO verification_requests (
                id, account_id, email, purpose, secret_hash,
                issued_at, expires_at, status, consumed_at, failed_attempts
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(request.id.0)
        .bind(request.account_id.0)
        .bind(request.email.as_str())
        .bind(request.purpose.as_str())
        .bind(&request.secret_hash)
        .bind(request.issued_at)
        .bind(request.expires_at)
        .bind(request.status.as_str())
        .bind(request.consumed_at)
        .bind(i32::try_from(request.failed_attempts).unwrap_or(i32::MAX))
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to insert verification request");
            AppError::database(format!("Failed to insert verification request: {}", e))
        })?;

        tx.commit()
            .await
            .map_err(|e| AppError::database(format!("Failed to commit transaction: {}", e)))?;

        debug!(
            request_id = %request.id,
            superseded = superseded.rows_affected(),
            "Pending verification request replaced"
        );
        Ok(())
    }

    async fn find_pending(
        &self,
        account_id: &AccountId,
        purpose: Purpose,
    ) -> AppResult<Option<VerificationRequest>> {
        let row = sqlx::query_as::<_, VerificationRow>(
            r#"
            SELECT id, account_id, email, purpose, secret_hash,
                   issued_at, expires_at, status, consumed_at, failed_attempts
            FROM verification_requests
            WHERE account_id = $1 AND purpose = $2 AND status = 'pending'
            "#,
        )
        .bind(account_id.0)
        .bind(purpose.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to find verification request: {}", e)))?;

        row.map(VerificationRequest::try_from).transpose()
    }

    async fn record_failed_attempt(
        &self,
        id: &VerificationRequestId,
        max_failed_attempts: u32,
    ) -> AppResult<Option<u32>> {
        let attempts: Option<i32> = sqlx::query_scalar(
            r#"
            UPDATE verification_requests
            SET failed_attempts = failed_attempts + 1
            WHERE id = $1 AND status = 'pending' AND failed_attempts < $2
            RETURNING failed_attempts
            "#,
        )
        .bind(id.0)
        .bind(attempt_budget(max_failed_attempts))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to record failed attempt: {}", e)))?;

        Ok(attempts.map(|n| u32::try_from(n).unwrap_or(0)))
    }

    async fn consume(
        &self,
        id: &VerificationRequestId,
        now: DateTime<Utc>,
        max_failed_attempts: u32,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE verification_requests
            SET status = 'consumed', consumed_at = $2
            WHERE id = $1 AND status = 'pending' AND expires_at > $2 AND failed_attempts < $3
            "#,
        )
        .bind(id.0)
        .bind(now)
        .bind(attempt_budget(max_failed_attempts))
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to consume verification request: {}", e)))?;

        Ok(result.rows_affected() == 1)
    }

    async fn delete(&self, id: &VerificationRequestId) -> AppResult<()> {
        sqlx::query("DELETE FROM verification_requests WHERE id = $1")
            .bind(id.0)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::database(format!("Failed to delete verification request: {}", e))
            })?;
        Ok(())
    }

    async fn count_issued_since(
        &self,
        account_id: &AccountId,
        purpose: Purpose,
        since: DateTime<Utc>,
    ) -> AppResult<u64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM verification_requests
            WHERE account_id = $1 AND purpose = $2 AND issued_at >= $3
            "#,
        )
        .bind(account_id.0)
        .bind(purpose.as_str())
        .bind(since)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to count verification requests: {}", e)))?;

        Ok(u64::try_from(count).unwrap_or(0))
    }

    async fn delete_expired_before(&self, cutoff: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM verification_requests WHERE expires_at < $1")
            .bind(cutoff)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::database(format!("Failed to prune verification requests: {}", e))
            })?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issuance_lock_key_is_scoped_to_account_and_purpose() {
        let account = AccountId::new();
        let other = AccountId::new();

        let verify = issuance_lock_key(&account, Purpose::EmailVerify);
        assert_eq!(verify, issuance_lock_key(&account, Purpose::EmailVerify));
        assert_ne!(verify, issuance_lock_key(&account, Purpose::PasswordReset));
        assert_ne!(verify, issuance_lock_key(&other, Purpose::EmailVerify));
        assert!(verify.ends_with(":email_verify"));
    }

    #[test]
    fn test_attempt_budget_saturates() {
        assert_eq!(attempt_budget(5), 5);
        assert_eq!(attempt_budget(u32::MAX), i32::MAX);
    }
}
