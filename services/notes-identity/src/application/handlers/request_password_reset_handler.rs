//! 请求密码重置处理器

use std::sync::Arc;

use async_trait::async_trait;
use notes_cqrs_core::CommandHandler;
use tracing::{debug, info};

use crate::application::commands::RequestPasswordResetCommand;
use crate::application::dispatcher::VerificationDispatcher;
use crate::domain::value_objects::Email;
use crate::domain::verification::Purpose;
use crate::error::AuthError;

/// 请求密码重置处理器
pub struct RequestPasswordResetHandler {
    dispatcher: Arc<VerificationDispatcher>,
}

impl RequestPasswordResetHandler {
    pub fn new(dispatcher: Arc<VerificationDispatcher>) -> Self {
        Self { dispatcher }
    }
}

#[async_trait]
impl CommandHandler<RequestPasswordResetCommand> for RequestPasswordResetHandler {
    async fn handle(&self, command: RequestPasswordResetCommand) -> Result<(), AuthError> {
        let email = Email::new(&command.email)?;

        // 为了防止账户枚举，账户不存在或被限流时仍然返回成功
        match self
            .dispatcher
            .dispatch_to_email(&email, Purpose::PasswordReset)
            .await
        {
            Ok(()) => {
                info!("Password reset link dispatched");
                Ok(())
            }
            Err(e @ (AuthError::UnknownAccount | AuthError::RateLimited)) => {
                debug!(reason = e.code(), "Password reset request absorbed");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}
