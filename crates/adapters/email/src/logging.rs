//! 模拟发送：只写日志，不访问网络

use crate::{EmailMessage, EmailSender};
use notes_errors::AppResult;
use tracing::info;

/// 开发环境使用的邮件发送器
///
/// 正文里带有验证码或重置令牌，只在 debug 级别输出。
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingEmailSender;

#[async_trait::async_trait]
impl EmailSender for LoggingEmailSender {
    async fn send(&self, message: &EmailMessage) -> AppResult<()> {
        info!(to = %message.to, subject = %message.subject, "Email delivery simulated (no transport configured)");
        tracing::debug!(body = %message.text_body, "Simulated email body");
        Ok(())
    }

    fn transport_name(&self) -> &'static str {
        "log"
    }
}
