//! 重置密码处理器

use std::sync::Arc;

use async_trait::async_trait;
use notes_common::Clock;
use notes_cqrs_core::CommandHandler;
use tracing::info;

use crate::application::commands::ResetPasswordCommand;
use crate::domain::repositories::AccountRepository;
use crate::domain::services::{ValidationMode, Validator};
use crate::domain::value_objects::{Email, HashedPassword};
use crate::domain::verification::Purpose;
use crate::error::AuthError;
use crate::infrastructure::metrics;

/// 重置密码处理器
pub struct ResetPasswordHandler {
    validator: Arc<Validator>,
    accounts: Arc<dyn AccountRepository>,
    clock: Arc<dyn Clock>,
}

impl ResetPasswordHandler {
    pub fn new(
        validator: Arc<Validator>,
        accounts: Arc<dyn AccountRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            validator,
            accounts,
            clock,
        }
    }
}

#[async_trait]
impl CommandHandler<ResetPasswordCommand> for ResetPasswordHandler {
    async fn handle(&self, command: ResetPasswordCommand) -> Result<(), AuthError> {
        let email = Email::new(&command.email)?;

        // 新密码不合规时令牌保持可用
        let password_hash = HashedPassword::from_plain(&command.new_password)?;

        let result = self
            .validator
            .verify(&email, Purpose::PasswordReset, &command.token, ValidationMode::Consume)
            .await;
        metrics::record_validation(Purpose::PasswordReset, &result);

        let account = result?.account;
        let now = self.clock.now();
        self.accounts
            .update_password(&account.id, &password_hash, now)
            .await?;
        // 能收到重置邮件即证明邮箱归属
        self.accounts.mark_email_verified(&account.id, now).await?;

        info!(account_id = %account.id, "Password reset completed");
        Ok(())
    }
}
