//! 验证请求实体

use chrono::{DateTime, Duration, Utc};
use notes_common::AccountId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::purpose::Purpose;
use super::secret::hash_secret;
use crate::domain::value_objects::Email;

/// 验证请求 ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VerificationRequestId(pub Uuid);

impl VerificationRequestId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for VerificationRequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for VerificationRequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 验证请求状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    Pending,
    Consumed,
    /// 被同用途的新请求取代
    Superseded,
}

impl VerificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Consumed => "consumed",
            Self::Superseded => "superseded",
        }
    }
}

impl FromStr for VerificationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "consumed" => Ok(Self::Consumed),
            "superseded" => Ok(Self::Superseded),
            other => Err(format!("Unknown verification status: {}", other)),
        }
    }
}

/// 校验失败原因，按判定顺序排列
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationFailure {
    NotFound,
    Expired,
    TooManyAttempts,
    Mismatch,
}

/// 验证请求
///
/// 只保存秘密的摘要；`expires_at` 严格晚于 `issued_at`。
#[derive(Debug, Clone)]
pub struct VerificationRequest {
    pub id: VerificationRequestId,
    pub account_id: AccountId,
    pub email: Email,
    pub purpose: Purpose,
    pub secret_hash: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub status: VerificationStatus,
    pub consumed_at: Option<DateTime<Utc>>,
    pub failed_attempts: u32,
}

impl VerificationRequest {
    /// 签发新的待验证请求
    pub fn issue(
        account_id: AccountId,
        email: Email,
        purpose: Purpose,
        secret: &str,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        Self {
            id: VerificationRequestId::new(),
            account_id,
            email,
            purpose,
            secret_hash: hash_secret(secret),
            issued_at: now,
            expires_at: now + ttl,
            status: VerificationStatus::Pending,
            consumed_at: None,
            failed_attempts: 0,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == VerificationStatus::Pending
    }

    /// 到达 `expires_at` 即视为过期
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// 比较候选值与存储摘要（忽略首尾空白）
    pub fn matches(&self, candidate: &str) -> bool {
        hash_secret(candidate.trim()) == self.secret_hash
    }

    /// 按固定顺序判定：状态、过期、尝试次数、值比对
    pub fn evaluate(
        &self,
        candidate: &str,
        now: DateTime<Utc>,
        max_failed_attempts: u32,
    ) -> Result<(), VerificationFailure> {
        if !self.is_pending() {
            return Err(VerificationFailure::NotFound);
        }
        if self.is_expired_at(now) {
            return Err(VerificationFailure::Expired);
        }
        if self.failed_attempts >= max_failed_attempts {
            return Err(VerificationFailure::TooManyAttempts);
        }
        if !self.matches(candidate) {
            return Err(VerificationFailure::Mismatch);
        }
        Ok(())
    }

    /// 标记为已使用，只有待验证且未过期的请求可以被使用
    pub fn mark_consumed(&mut self, now: DateTime<Utc>) -> bool {
        if !self.is_pending() || self.is_expired_at(now) {
            return false;
        }
        self.status = VerificationStatus::Consumed;
        self.consumed_at = Some(now);
        true
    }

    pub fn mark_superseded(&mut self) {
        if self.is_pending() {
            self.status = VerificationStatus::Superseded;
        }
    }
}
