//! 集成测试公共装置

#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::{DateTime, TimeZone, Utc};
use notes_adapter_email::RecordingEmailSender;
use notes_common::ManualClock;
use notes_identity::api::http::{AppState, build_router};
use notes_identity::domain::services::DeliveryPolicy;
use notes_identity::domain::verification::VerificationPolicy;
use notes_identity::infrastructure::notification::EmailNotifier;
use notes_identity::infrastructure::persistence::{
    InMemoryAccountRepository, InMemoryVerificationRepository,
};
use notes_identity::{ServiceDeps, build_state};
use serde_json::Value;
use tower::ServiceExt;

pub const PASSWORD: &str = "Sup3r-Secret";
pub const RESET_BASE_URL: &str = "https://notes.example.com/reset";

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub clock: Arc<ManualClock>,
    pub sender: Arc<RecordingEmailSender>,
    pub accounts: Arc<InMemoryAccountRepository>,
    pub verifications: Arc<InMemoryVerificationRepository>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_delivery(DeliveryPolicy::Lenient)
    }

    pub fn with_delivery(delivery: DeliveryPolicy) -> Self {
        Self::build(delivery, VerificationPolicy::default())
    }

    pub fn build(delivery: DeliveryPolicy, policy: VerificationPolicy) -> Self {
        let clock = Arc::new(ManualClock::new(t0()));
        let sender = Arc::new(RecordingEmailSender::new());
        let accounts = Arc::new(InMemoryAccountRepository::new());
        let verifications = Arc::new(InMemoryVerificationRepository::new());
        let notifier = Arc::new(
            EmailNotifier::new(sender.clone(), "Web Notes", RESET_BASE_URL).unwrap(),
        );

        let state = build_state(ServiceDeps {
            accounts: accounts.clone(),
            verifications: verifications.clone(),
            notifier,
            clock: clock.clone(),
            policy,
            delivery,
            health_checks: Vec::new(),
            metrics: None,
        });

        Self {
            router: build_router(state.clone()),
            state,
            clock,
            sender,
            accounts,
            verifications,
        }
    }

    pub async fn post(&self, path: &str, body: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    pub async fn get(&self, path: &str) -> (StatusCode, Value) {
        let request = Request::builder().uri(path).body(Body::empty()).unwrap();
        self.send(request).await
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    /// 最近一封发往该邮箱的验证码
    pub fn last_code(&self, email: &str) -> Option<String> {
        let message = self.sender.last_to(email)?;
        message
            .text_body
            .split_whitespace()
            .find(|w| w.len() == 6 && w.chars().all(|c| c.is_ascii_digit()))
            .map(str::to_string)
    }

    /// 最近一封发往该邮箱的重置令牌（从链接中解析）
    pub fn last_reset_token(&self, email: &str) -> Option<String> {
        let message = self.sender.last_to(email)?;
        let start = message.text_body.find("token=")? + "token=".len();
        let rest = &message.text_body[start..];
        let end = rest.find('&').unwrap_or(rest.len());
        Some(rest[..end].to_string())
    }

    pub fn emails_to(&self, email: &str) -> usize {
        self.sender.sent().iter().filter(|m| m.to == email).count()
    }

    pub async fn register(&self, email: &str) -> (StatusCode, Value) {
        self.post(
            "/api/auth/register",
            serde_json::json!({ "email": email, "password": PASSWORD }),
        )
        .await
    }

    /// 注册并完成邮箱验证
    pub async fn register_verified(&self, email: &str) {
        let (status, _) = self.register(email).await;
        assert_eq!(status, StatusCode::OK);
        let code = self.last_code(email).unwrap();
        let (status, _) = self
            .post(
                "/api/auth/verification/verify",
                serde_json::json!({ "email": email, "code": code }),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
    }

    pub async fn forgot_password(&self, email: &str) -> (StatusCode, Value) {
        self.post(
            "/api/auth/password/forgot",
            serde_json::json!({ "email": email }),
        )
        .await
    }
}

/// 与 `code` 不同的 6 位数字
pub fn wrong_code(code: &str) -> String {
    if code == "000000" {
        "111111".to_string()
    } else {
        "000000".to_string()
    }
}
