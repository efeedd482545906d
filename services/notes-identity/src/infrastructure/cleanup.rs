//! 过期验证请求的周期清理

use std::sync::Arc;
use std::time::Duration;

use notes_common::Clock;
use notes_errors::AppResult;
use tokio::time::interval;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::domain::repositories::VerificationRepository;

pub struct CleanupTask {
    verifications: Arc<dyn VerificationRepository>,
    clock: Arc<dyn Clock>,
    interval: Duration,
    retention: chrono::Duration,
}

impl CleanupTask {
    pub fn new(
        verifications: Arc<dyn VerificationRepository>,
        clock: Arc<dyn Clock>,
        interval: Duration,
        retention: chrono::Duration,
    ) -> Self {
        Self {
            verifications,
            clock,
            interval,
            retention,
        }
    }

    pub fn start(self: Arc<Self>, shutdown: CancellationToken) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            info!(interval_secs = self.interval.as_secs(), "Cleanup task started");
            let mut ticker = interval(self.interval);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if let Err(e) = self.run_once().await {
                            error!(error = %e, "Failed to run periodic cleanup");
                        }
                    }
                    _ = shutdown.cancelled() => {
                        info!("Cleanup task received shutdown signal");
                        break;
                    }
                }
            }
            info!("Cleanup task stopped");
        })
    }

    /// 删除过期时间早于保留窗口的请求
    pub async fn run_once(&self) -> AppResult<u64> {
        let cutoff = self.clock.now() - self.retention;
        let removed = self.verifications.delete_expired_before(cutoff).await?;
        if removed > 0 {
            info!(removed, cutoff = %cutoff, "Pruned expired verification requests");
        } else {
            debug!("No expired verification requests to prune");
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::account::Account;
    use crate::domain::value_objects::{Email, HashedPassword};
    use crate::domain::verification::{Purpose, VerificationRequest};
    use crate::infrastructure::persistence::InMemoryVerificationRepository;
    use chrono::{TimeZone, Utc};
    use notes_common::ManualClock;

    #[tokio::test]
    async fn test_run_once_respects_retention() {
        let t0 = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        let clock = Arc::new(ManualClock::new(t0));
        let repo = Arc::new(InMemoryVerificationRepository::new());

        let account = Account::register(
            Email::new("ann@example.com").unwrap(),
            HashedPassword::from_hash("$argon2id$stub".to_string()),
            t0,
        );
        let request = VerificationRequest::issue(
            account.id,
            account.email.clone(),
            Purpose::EmailVerify,
            "123456",
            t0,
            chrono::Duration::minutes(10),
        );
        repo.replace_pending(&request).await.unwrap();

        let task = CleanupTask::new(
            repo.clone(),
            clock.clone(),
            Duration::from_secs(60),
            chrono::Duration::hours(24),
        );

        clock.advance(chrono::Duration::hours(1));
        assert_eq!(task.run_once().await.unwrap(), 0);

        clock.advance(chrono::Duration::hours(24));
        assert_eq!(task.run_once().await.unwrap(), 1);
        assert!(repo.is_empty().await);
    }

    #[tokio::test]
    async fn test_start_stops_on_cancel() {
        let repo = Arc::new(InMemoryVerificationRepository::new());
        let task = Arc::new(CleanupTask::new(
            repo,
            Arc::new(ManualClock::default()),
            Duration::from_millis(10),
            chrono::Duration::hours(24),
        ));

        let shutdown = CancellationToken::new();
        let handle = task.start(shutdown.clone());
        shutdown.cancel();
        handle.await.unwrap();
    }
}
