//! 路由共享状态

use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusHandle;
use notes_common::HealthCheck;

use crate::application::handlers::{
    CheckResetTokenHandler, LoginHandler, RegisterHandler, RequestPasswordResetHandler,
    ResetPasswordHandler, SendEmailVerificationHandler, VerifyEmailHandler,
};

#[derive(Clone)]
pub struct AppState {
    pub register: Arc<RegisterHandler>,
    pub login: Arc<LoginHandler>,
    pub send_email_verification: Arc<SendEmailVerificationHandler>,
    pub verify_email: Arc<VerifyEmailHandler>,
    pub request_password_reset: Arc<RequestPasswordResetHandler>,
    pub check_reset_token: Arc<CheckResetTokenHandler>,
    pub reset_password: Arc<ResetPasswordHandler>,
    pub health_checks: Arc<Vec<Arc<dyn HealthCheck>>>,
    /// 未安装 Prometheus recorder 时为 None
    pub metrics: Option<PrometheusHandle>,
}
