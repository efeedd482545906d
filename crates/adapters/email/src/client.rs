//! SMTP 邮件客户端实现

use crate::{EmailConfig, EmailMessage, EmailSender};
use lettre::message::{Mailbox, MultiPart, SinglePart, header};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use notes_errors::{AppError, AppResult};
use secrecy::ExposeSecret;
use std::time::Duration;
use tracing::{debug, info, warn};

/// SMTP 邮件客户端
pub struct EmailClient {
    from: Mailbox,
    transport: SmtpTransport,
}

impl EmailClient {
    /// 创建新的邮件客户端
    ///
    /// 传输层在这里构建，配置错误在启动时暴露，不会等到第一次发信。
    pub fn new(config: &EmailConfig) -> AppResult<Self> {
        let from = format!("{} <{}>", config.from_name, config.from_email)
            .parse()
            .map_err(|e| AppError::internal(format!("Invalid from address: {}", e)))?;

        Ok(Self {
            from,
            transport: Self::build_transport(config)?,
        })
    }

    /// 构建 SMTP 传输
    fn build_transport(config: &EmailConfig) -> AppResult<SmtpTransport> {
        let credentials = Credentials::new(
            config.username.clone(),
            config.password.expose_secret().clone(),
        );

        let transport = if config.use_tls {
            SmtpTransport::starttls_relay(&config.smtp_host)
        } else {
            SmtpTransport::relay(&config.smtp_host)
        }
        .map_err(|e| AppError::internal(format!("Failed to create SMTP transport: {}", e)))?
        .port(config.smtp_port)
        .credentials(credentials)
        .timeout(Some(Duration::from_secs(config.timeout_secs)))
        .build();

        Ok(transport)
    }

    /// 构建邮件消息
    fn build_message(&self, msg: &EmailMessage) -> AppResult<Message> {
        let to: Mailbox = msg
            .to
            .parse()
            .map_err(|e| AppError::validation(format!("Invalid to address: {}", e)))?;

        let text_part = SinglePart::builder()
            .header(header::ContentType::TEXT_PLAIN)
            .body(msg.text_body.clone());

        // HTML + 纯文本备用
        let body = match &msg.html_body {
            Some(html) => MultiPart::alternative().singlepart(text_part).singlepart(
                SinglePart::builder()
                    .header(header::ContentType::TEXT_HTML)
                    .body(html.clone()),
            ),
            None => MultiPart::alternative().singlepart(text_part),
        };

        Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(&msg.subject)
            .multipart(body)
            .map_err(|e| AppError::internal(format!("Failed to build message: {}", e)))
    }
}

#[async_trait::async_trait]
impl EmailSender for EmailClient {
    async fn send(&self, msg: &EmailMessage) -> AppResult<()> {
        debug!(to = %msg.to, subject = %msg.subject, "Sending email via SMTP");

        let message = self.build_message(msg)?;
        let transport = self.transport.clone();

        // 在 tokio 的 blocking 线程池中执行同步操作
        tokio::task::spawn_blocking(move || {
            transport
                .send(&message)
                .map_err(|e| AppError::external_service(format!("Failed to send email: {}", e)))
        })
        .await
        .map_err(|e| AppError::internal(format!("Task join error: {}", e)))?
        .inspect_err(|e| warn!(to = %msg.to, error = %e, "SMTP delivery failed"))?;

        info!(to = %msg.to, subject = %msg.subject, "Email sent successfully");
        Ok(())
    }

    fn transport_name(&self) -> &'static str {
        "smtp"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> EmailConfig {
        EmailConfig {
            smtp_host: "smtp.example.com".to_string(),
            smtp_port: 587,
            username: "user@example.com".to_string(),
            password: secrecy::Secret::new("password".to_string()),
            from_email: "noreply@example.com".to_string(),
            from_name: "Web Notes".to_string(),
            use_tls: true,
            timeout_secs: 30,
        }
    }

    #[test]
    fn test_build_message_with_html_alternative() {
        let client = EmailClient::new(&config()).unwrap();

        let msg = EmailMessage {
            to: "test@example.com".to_string(),
            subject: "Your code".to_string(),
            text_body: "123456".to_string(),
            html_body: Some("<p>123456</p>".to_string()),
        };

        let message = client.build_message(&msg).unwrap();
        let raw = String::from_utf8(message.formatted()).unwrap();
        assert!(raw.contains("Subject: Your code"));
        assert!(raw.contains("text/html"));
    }

    #[test]
    fn test_build_message_rejects_bad_recipient() {
        let client = EmailClient::new(&config()).unwrap();

        let msg = EmailMessage {
            to: "not an address".to_string(),
            subject: "x".to_string(),
            text_body: "x".to_string(),
            html_body: None,
        };

        assert!(matches!(
            client.build_message(&msg),
            Err(AppError::Validation(_))
        ));
    }
}
