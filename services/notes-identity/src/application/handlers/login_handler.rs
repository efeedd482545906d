//! 登录处理器

use std::sync::Arc;

use async_trait::async_trait;
use notes_cqrs_core::CommandHandler;
use tracing::{info, warn};

use crate::application::commands::{LoginCommand, LoginResult};
use crate::application::dispatcher::VerificationDispatcher;
use crate::domain::repositories::AccountRepository;
use crate::domain::value_objects::Email;
use crate::domain::verification::Purpose;
use crate::error::AuthError;

pub struct LoginHandler {
    accounts: Arc<dyn AccountRepository>,
    dispatcher: Arc<VerificationDispatcher>,
}

impl LoginHandler {
    pub fn new(accounts: Arc<dyn AccountRepository>, dispatcher: Arc<VerificationDispatcher>) -> Self {
        Self {
            accounts,
            dispatcher,
        }
    }
}

#[async_trait]
impl CommandHandler<LoginCommand> for LoginHandler {
    async fn handle(&self, command: LoginCommand) -> Result<LoginResult, AuthError> {
        let email = Email::new(&command.email)?;

        let account = self
            .accounts
            .find_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !account.password_hash.verify(&command.password)? {
            warn!(account_id = %account.id, "Login rejected: wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        if !account.email_verified {
            // 未验证账户登录时补发验证码；限流时仍提示未验证
            match self.dispatcher.dispatch(&account, Purpose::EmailVerify).await {
                Ok(()) | Err(AuthError::RateLimited) => {}
                Err(e) => return Err(e),
            }
            info!(account_id = %account.id, "Login blocked until email is verified");
            return Err(AuthError::EmailNotVerified);
        }

        info!(account_id = %account.id, "Login succeeded");

        Ok(LoginResult {
            account_id: account.id,
            email_verified: account.email_verified,
        })
    }
}
