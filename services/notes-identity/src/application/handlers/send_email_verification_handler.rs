//! 发送邮箱验证码处理器

use std::sync::Arc;

use async_trait::async_trait;
use notes_cqrs_core::CommandHandler;
use tracing::{debug, info};

use crate::application::commands::SendEmailVerificationCommand;
use crate::application::dispatcher::VerificationDispatcher;
use crate::domain::value_objects::Email;
use crate::domain::verification::Purpose;
use crate::error::AuthError;

pub struct SendEmailVerificationHandler {
    dispatcher: Arc<VerificationDispatcher>,
}

impl SendEmailVerificationHandler {
    pub fn new(dispatcher: Arc<VerificationDispatcher>) -> Self {
        Self { dispatcher }
    }
}

#[async_trait]
impl CommandHandler<SendEmailVerificationCommand> for SendEmailVerificationHandler {
    async fn handle(&self, command: SendEmailVerificationCommand) -> Result<(), AuthError> {
        let email = Email::new(&command.email)?;

        // 未知账户、已验证、限流都返回成功，避免泄露账户状态
        match self
            .dispatcher
            .dispatch_to_email(&email, Purpose::EmailVerify)
            .await
        {
            Ok(()) => {
                info!("Email verification code dispatched");
                Ok(())
            }
            Err(e @ (AuthError::UnknownAccount | AuthError::AlreadyVerified | AuthError::RateLimited)) => {
                debug!(reason = e.code(), "Email verification request absorbed");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}
