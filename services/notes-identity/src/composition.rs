//! 依赖装配

use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusHandle;
use notes_adapter_email::{EmailClient, EmailSender, LoggingEmailSender};
use notes_common::{Clock, HealthCheck};
use notes_config::AppConfig;
use notes_errors::{AppError, AppResult};
use tracing::{info, warn};

use crate::api::http::AppState;
use crate::application::VerificationDispatcher;
use crate::application::handlers::{
    CheckResetTokenHandler, LoginHandler, RegisterHandler, RequestPasswordResetHandler,
    ResetPasswordHandler, SendEmailVerificationHandler, VerifyEmailHandler,
};
use crate::domain::repositories::{AccountRepository, VerificationRepository};
use crate::domain::services::{DeliveryPolicy, Notifier, TokenIssuer, Validator};
use crate::domain::verification::VerificationPolicy;

/// 服务依赖
pub struct ServiceDeps {
    pub accounts: Arc<dyn AccountRepository>,
    pub verifications: Arc<dyn VerificationRepository>,
    pub notifier: Arc<dyn Notifier>,
    pub clock: Arc<dyn Clock>,
    pub policy: VerificationPolicy,
    pub delivery: DeliveryPolicy,
    pub health_checks: Vec<Arc<dyn HealthCheck>>,
    pub metrics: Option<PrometheusHandle>,
}

/// 组装领域服务与处理器
pub fn build_state(deps: ServiceDeps) -> AppState {
    let issuer = Arc::new(TokenIssuer::new(
        deps.accounts.clone(),
        deps.verifications.clone(),
        deps.clock.clone(),
        deps.policy.clone(),
    ));
    let validator = Arc::new(Validator::new(
        deps.accounts.clone(),
        deps.verifications.clone(),
        deps.clock.clone(),
        deps.policy,
    ));
    let dispatcher = Arc::new(VerificationDispatcher::new(
        issuer,
        deps.notifier,
        deps.delivery,
    ));

    AppState {
        register: Arc::new(RegisterHandler::new(
            deps.accounts.clone(),
            dispatcher.clone(),
            deps.clock.clone(),
        )),
        login: Arc::new(LoginHandler::new(deps.accounts.clone(), dispatcher.clone())),
        send_email_verification: Arc::new(SendEmailVerificationHandler::new(dispatcher.clone())),
        verify_email: Arc::new(VerifyEmailHandler::new(
            validator.clone(),
            deps.accounts.clone(),
            deps.clock.clone(),
        )),
        request_password_reset: Arc::new(RequestPasswordResetHandler::new(dispatcher)),
        check_reset_token: Arc::new(CheckResetTokenHandler::new(validator.clone())),
        reset_password: Arc::new(ResetPasswordHandler::new(
            validator,
            deps.accounts,
            deps.clock,
        )),
        health_checks: Arc::new(deps.health_checks),
        metrics: deps.metrics,
    }
}

/// 按配置选择邮件发送器
///
/// 配置了 `[email]` 时走 SMTP；否则非生产环境只记录日志，生产环境拒绝启动。
pub fn select_email_sender(config: &AppConfig) -> AppResult<Arc<dyn EmailSender>> {
    match &config.email {
        Some(email) => {
            info!(smtp_host = %email.smtp_host, "Using SMTP email transport");
            Ok(Arc::new(EmailClient::new(email)?))
        }
        None if config.is_production() => Err(AppError::failed_precondition(
            "An [email] transport is required in production",
        )),
        None => {
            warn!("No email transport configured, email delivery will be simulated");
            Ok(Arc::new(LoggingEmailSender))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::{Figment, providers::Serialized};
    use serde_json::json;

    fn config(env: &str, with_email: bool) -> AppConfig {
        let mut value = json!({
            "app_name": "web-notes",
            "app_env": env,
            "server": { "host": "127.0.0.1", "port": 3000 },
            "verification": { "reset_link_base_url": "https://notes.example.com/reset" }
        });
        if with_email {
            value["email"] = json!({
                "smtp_host": "smtp.example.com",
                "smtp_port": 587,
                "username": "mailer",
                "password": "secret",
                "from_email": "no-reply@example.com",
                "from_name": "Web Notes",
                "use_tls": true
            });
        }
        let mut parsed: AppConfig = Figment::from(Serialized::defaults(value)).extract().unwrap();
        parsed.app_env = env.to_string();
        parsed
    }

    #[test]
    fn test_development_without_email_simulates_delivery() {
        let sender = select_email_sender(&config("development", false)).unwrap();
        assert_eq!(sender.transport_name(), "log");
    }

    #[test]
    fn test_production_without_email_is_rejected() {
        assert!(select_email_sender(&config("production", false)).is_err());
    }

    #[test]
    fn test_configured_email_uses_smtp() {
        let sender = select_email_sender(&config("production", true)).unwrap();
        assert_eq!(sender.transport_name(), "smtp");
    }
}
