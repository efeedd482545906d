//! Email 适配器
//!
//! 提供邮件发送功能，支持：
//! - SMTP 邮件发送
//! - 开发环境下的模拟发送（只记日志，不连网络）
//! - 模板渲染（纯文本 + HTML）

mod client;
mod logging;
#[cfg(any(test, feature = "test-util"))]
mod recording;
mod template;

pub use client::EmailClient;
pub use logging::LoggingEmailSender;
#[cfg(any(test, feature = "test-util"))]
pub use recording::RecordingEmailSender;
pub use template::{EmailTemplate, RenderedEmail};

pub use notes_config::EmailConfig;

use notes_errors::AppResult;

/// 邮件消息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub text_body: String,
    pub html_body: Option<String>,
}

impl EmailMessage {
    /// 由渲染好的模板构建
    pub fn from_rendered(to: impl Into<String>, rendered: RenderedEmail) -> Self {
        Self {
            to: to.into(),
            subject: rendered.subject,
            text_body: rendered.text,
            html_body: Some(rendered.html),
        }
    }
}

/// 邮件发送接口
#[async_trait::async_trait]
pub trait EmailSender: Send + Sync {
    /// 发送一封邮件
    async fn send(&self, message: &EmailMessage) -> AppResult<()>;

    /// 传输方式名称，用于日志
    fn transport_name(&self) -> &'static str;
}
