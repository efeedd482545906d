//! PostgreSQL 账户仓储实现

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use notes_common::AccountId;
use notes_errors::{AppError, AppResult};
use sqlx::PgPool;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::domain::account::Account;
use crate::domain::repositories::AccountRepository;
use crate::domain::value_objects::{Email, HashedPassword};

const SELECT_ACCOUNT: &str = r#"
    SELECT id, email, password_hash, email_verified, email_verified_at, created_at, updated_at
    FROM accounts
"#;

#[derive(sqlx::FromRow)]
struct AccountRow {
    id: Uuid,
    email: String,
    password_hash: String,
    email_verified: bool,
    email_verified_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<AccountRow> for Account {
    fn from(row: AccountRow) -> Self {
        Self {
            id: AccountId::from_uuid(row.id),
            email: Email::from_trusted(row.email),
            password_hash: HashedPassword::from_hash(row.password_hash),
            email_verified: row.email_verified,
            email_verified_at: row.email_verified_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// PostgreSQL 账户仓储
pub struct PostgresAccountRepository {
    pool: PgPool,
}

impl PostgresAccountRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccountRepository for PostgresAccountRepository {
    async fn save(&self, account: &Account) -> AppResult<()> {
        debug!(account_id = %account.id, "Saving account");

        sqlx::query(
            r#"
            INSERT INTO accounts (
                id, email, password_hash, email_verified, email_verified_at, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(account.id.0)
        .bind(account.email.as_str())
        .bind(account.password_hash.as_str())
        .bind(account.email_verified)
        .bind(account.email_verified_at)
        .bind(account.created_at)
        .bind(account.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AppError::conflict("Email already registered")
            }
            other => {
                warn!(error = %other, "Failed to save account");
                AppError::database(format!("Failed to save account: {}", other))
            }
        })?;

        Ok(())
    }

    async fn find_by_email(&self, email: &Email) -> AppResult<Option<Account>> {
        let sql = format!("{} WHERE email = $1", SELECT_ACCOUNT);
        let row = sqlx::query_as::<_, AccountRow>(&sql)
            .bind(email.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to find account: {}", e)))?;

        Ok(row.map(Account::from))
    }

    async fn mark_email_verified(&self, id: &AccountId, at: DateTime<Utc>) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE accounts
            SET email_verified = TRUE,
                email_verified_at = COALESCE(email_verified_at, $2),
                updated_at = CASE WHEN email_verified THEN updated_at ELSE $2 END
            WHERE id = $1
            "#,
        )
        .bind(id.0)
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to mark email verified");
            AppError::database(format!("Failed to mark email verified: {}", e))
        })?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("Account {} not found", id)));
        }

        Ok(())
    }

    async fn update_password(
        &self,
        id: &AccountId,
        password_hash: &HashedPassword,
        at: DateTime<Utc>,
    ) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE accounts SET password_hash = $2, updated_at = $3 WHERE id = $1",
        )
        .bind(id.0)
        .bind(password_hash.as_str())
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to update password");
            AppError::database(format!("Failed to update password: {}", e))
        })?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("Account {} not found", id)));
        }

        Ok(())
    }
}
