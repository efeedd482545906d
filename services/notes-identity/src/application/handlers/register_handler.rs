//! 注册处理器

use std::sync::Arc;

use async_trait::async_trait;
use notes_common::Clock;
use notes_cqrs_core::CommandHandler;
use notes_errors::AppError;
use tracing::info;

use crate::application::commands::{RegisterCommand, RegisterResult};
use crate::application::dispatcher::VerificationDispatcher;
use crate::domain::account::Account;
use crate::domain::repositories::AccountRepository;
use crate::domain::value_objects::{Email, HashedPassword};
use crate::domain::verification::Purpose;
use crate::error::AuthError;

pub struct RegisterHandler {
    accounts: Arc<dyn AccountRepository>,
    dispatcher: Arc<VerificationDispatcher>,
    clock: Arc<dyn Clock>,
}

impl RegisterHandler {
    pub fn new(
        accounts: Arc<dyn AccountRepository>,
        dispatcher: Arc<VerificationDispatcher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            accounts,
            dispatcher,
            clock,
        }
    }
}

#[async_trait]
impl CommandHandler<RegisterCommand> for RegisterHandler {
    async fn handle(&self, command: RegisterCommand) -> Result<RegisterResult, AuthError> {
        let email = Email::new(&command.email)?;
        let password_hash = HashedPassword::from_plain(&command.password)?;

        let account = Account::register(email, password_hash, self.clock.now());
        self.accounts.save(&account).await.map_err(|e| match e {
            AppError::Conflict(_) => AuthError::EmailInUse,
            other => AuthError::Infrastructure(other),
        })?;

        info!(account_id = %account.id, "Account registered");

        // 投递失败时账户仍保留，客户端通过重新发送验证码恢复
        self.dispatcher
            .dispatch(&account, Purpose::EmailVerify)
            .await?;

        Ok(RegisterResult {
            account_id: account.id,
        })
    }
}
