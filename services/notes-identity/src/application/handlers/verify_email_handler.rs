//! 验证邮箱处理器

use std::sync::Arc;

use async_trait::async_trait;
use notes_common::Clock;
use notes_cqrs_core::CommandHandler;
use tracing::info;

use crate::application::commands::VerifyEmailCommand;
use crate::domain::repositories::AccountRepository;
use crate::domain::services::{ValidationMode, Validator};
use crate::domain::value_objects::Email;
use crate::domain::verification::Purpose;
use crate::error::AuthError;
use crate::infrastructure::metrics;

pub struct VerifyEmailHandler {
    validator: Arc<Validator>,
    accounts: Arc<dyn AccountRepository>,
    clock: Arc<dyn Clock>,
}

impl VerifyEmailHandler {
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
impl CommandHandler<VerifyEmailCommand> for VerifyEmailHandler {
    async fn handle(&self, command: VerifyEmailCommand) -> Result<(), AuthError> {
        let email = Email::new(&command.email)?;

        let result = self
            .validator
            .verify(&email, Purpose::EmailVerify, &command.code, ValidationMode::Consume)
            .await;
        metrics::record_validation(Purpose::EmailVerify, &result);

        let account = result?.account;
        self.accounts
            .mark_email_verified(&account.id, self.clock.now())
            .await?;

        info!(account_id = %account.id, "Email verified");
        Ok(())
    }
}
