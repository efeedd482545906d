//! 邮件通知器
//!
//! 按用途渲染内置模板（纯文本 + HTML），通过 [`EmailSender`] 投递。

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Duration;
use notes_adapter_email::{EmailMessage, EmailSender, EmailTemplate};
use notes_errors::AppResult;
use serde_json::json;
use tracing::{info, warn};

use crate::domain::services::Notifier;
use crate::domain::value_objects::Email;
use crate::domain::verification::Purpose;
use crate::infrastructure::metrics;

const BUILTIN_TEMPLATES: &[(&str, &str)] = &[
    (
        "email_verification.txt",
        include_str!("../../../templates/email_verification.txt"),
    ),
    (
        "email_verification.html",
        include_str!("../../../templates/email_verification.html"),
    ),
    (
        "password_reset.txt",
        include_str!("../../../templates/password_reset.txt"),
    ),
    (
        "password_reset.html",
        include_str!("../../../templates/password_reset.html"),
    ),
];

/// 加载内置模板
pub fn builtin_templates() -> AppResult<EmailTemplate> {
    let templates: HashMap<String, String> = BUILTIN_TEMPLATES
        .iter()
        .map(|(name, content)| (name.to_string(), content.to_string()))
        .collect();
    EmailTemplate::from_strings(templates)
}

/// 邮件通知器
pub struct EmailNotifier {
    sender: Arc<dyn EmailSender>,
    templates: EmailTemplate,
    app_name: String,
    reset_link_base_url: String,
}

impl EmailNotifier {
    pub fn new(
        sender: Arc<dyn EmailSender>,
        app_name: impl Into<String>,
        reset_link_base_url: impl Into<String>,
    ) -> AppResult<Self> {
        Ok(Self {
            sender,
            templates: builtin_templates()?,
            app_name: app_name.into(),
            reset_link_base_url: reset_link_base_url.into(),
        })
    }

    /// `{base}?token=..&email=..`，参数均做 URL 编码
    pub fn reset_link(&self, email: &Email, token: &str) -> String {
        let separator = if self.reset_link_base_url.contains('?') {
            '&'
        } else {
            '?'
        };
        format!(
            "{}{}token={}&email={}",
            self.reset_link_base_url,
            separator,
            urlencoding::encode(token),
            urlencoding::encode(email.as_str())
        )
    }

    fn compose(
        &self,
        email: &Email,
        purpose: Purpose,
        secret: &str,
        ttl: Duration,
    ) -> AppResult<EmailMessage> {
        let ttl_minutes = ttl.num_minutes();
        let (template, subject, context) = match purpose {
            Purpose::EmailVerify => (
                "email_verification",
                format!("Your {} verification code", self.app_name),
                json!({
                    "app_name": self.app_name,
                    "code": secret,
                    "ttl_minutes": ttl_minutes,
                }),
            ),
            Purpose::PasswordReset => (
                "password_reset",
                format!("Reset your {} password", self.app_name),
                json!({
                    "app_name": self.app_name,
                    "reset_link": self.reset_link(email, secret),
                    "ttl_minutes": ttl_minutes,
                }),
            ),
        };

        let rendered = self.templates.render_pair(template, subject, &context)?;
        Ok(EmailMessage::from_rendered(email.as_str(), rendered))
    }
}

#[async_trait]
impl Notifier for EmailNotifier {
    async fn notify(
        &self,
        email: &Email,
        purpose: Purpose,
        secret: &str,
        ttl: Duration,
    ) -> AppResult<()> {
        let message = self.compose(email, purpose, secret, ttl)?;

        match self.sender.send(&message).await {
            Ok(()) => {
                metrics::record_delivery(true);
                info!(
                    purpose = %purpose,
                    transport = self.sender.transport_name(),
                    "Verification email delivered"
                );
                Ok(())
            }
            Err(e) => {
                metrics::record_delivery(false);
                warn!(
                    purpose = %purpose,
                    transport = self.sender.transport_name(),
                    error = %e,
                    "Verification email delivery failed"
                );
                Err(e)
            }
        }
    }
}
