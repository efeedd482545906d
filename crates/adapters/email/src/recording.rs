//! 测试替身：记录所有发出的邮件，可切换为失败模式

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::{EmailMessage, EmailSender};
use notes_errors::{AppError, AppResult};

#[derive(Debug, Default)]
pub struct RecordingEmailSender {
    sent: Mutex<Vec<EmailMessage>>,
    failing: AtomicBool,
}

impl RecordingEmailSender {
    pub fn new() -> Self {
        Self::default()
    }

    /// 之后的发送全部失败（模拟 SMTP 故障）
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<EmailMessage> {
        self.sent
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn last_to(&self, to: &str) -> Option<EmailMessage> {
        self.sent().into_iter().rev().find(|m| m.to == to)
    }
}

#[async_trait::async_trait]
impl EmailSender for RecordingEmailSender {
    async fn send(&self, message: &EmailMessage) -> AppResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(AppError::external_service("simulated SMTP failure"));
        }
        self.sent
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(message.clone());
        Ok(())
    }

    fn transport_name(&self) -> &'static str {
        "recording"
    }
}
