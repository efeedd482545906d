//! 服务数据库迁移

use notes_adapter_postgres::{Migration, MigrationManager};
use notes_errors::AppResult;
use sqlx::PgPool;
use tracing::info;

const CREATE_ACCOUNTS: &str = r#"
CREATE TABLE IF NOT EXISTS accounts (
    id UUID PRIMARY KEY,
    email VARCHAR(254) NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    email_verified BOOLEAN NOT NULL DEFAULT FALSE,
    email_verified_at TIMESTAMPTZ,
    created_at TIMESTAMPTZ NOT NULL,
    updated_at TIMESTAMPTZ NOT NULL
);
"#;

const CREATE_VERIFICATION_REQUESTS: &str = r#"
CREATE TABLE IF NOT EXISTS verification_requests (
    id UUID PRIMARY KEY,
    account_id UUID NOT NULL REFERENCES accounts(id) ON DELETE CASCADE,
    email VARCHAR(254) NOT NULL,
    purpose VARCHAR(32) NOT NULL,
    secret_hash CHAR(64) NOT NULL,
    issued_at TIMESTAMPTZ NOT NULL,
    expires_at TIMESTAMPTZ NOT NULL,
    status VARCHAR(16) NOT NULL DEFAULT 'pending',
    consumed_at TIMESTAMPTZ,
    failed_attempts INTEGER NOT NULL DEFAULT 0,
    CONSTRAINT verification_requests_expiry_check CHECK (expires_at > issued_at)
);

CREATE UNIQUE INDEX IF NOT EXISTS verification_requests_one_pending
    ON verification_requests (account_id, purpose)
    WHERE status = 'pending';

CREATE INDEX IF NOT EXISTS verification_requests_issued_at
    ON verification_requests (account_id, purpose, issued_at);

CREATE INDEX IF NOT EXISTS verification_requests_expires_at
    ON verification_requests (expires_at);
"#;

/// 服务的全部迁移
pub fn all() -> Vec<Migration> {
    vec![
        Migration::new(1, "create_accounts", CREATE_ACCOUNTS),
        Migration::new(2, "create_verification_requests", CREATE_VERIFICATION_REQUESTS),
    ]
}

/// 执行待处理的迁移
pub async fn run(pool: &PgPool) -> AppResult<()> {
    let applied = MigrationManager::new(pool.clone()).migrate(&all()).await?;
    info!(applied = ?applied, "Database migrations complete");
    Ok(())
}
