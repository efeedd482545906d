//! 签发 / 校验流程（领域服务层）

mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use common::{PASSWORD, RESET_BASE_URL, t0, wrong_code};
use notes_adapter_email::RecordingEmailSender;
use notes_common::{AccountId, ManualClock};
use notes_errors::AppResult;
use notes_identity::AuthError;
use notes_identity::application::VerificationDispatcher;
use notes_identity::domain::account::Account;
use notes_identity::domain::repositories::{AccountRepository, VerificationRepository};
use notes_identity::domain::services::{DeliveryPolicy, TokenIssuer, ValidationMode, Validator};
use notes_identity::domain::value_objects::{Email, HashedPassword};
use notes_identity::domain::verification::{
    Purpose, VerificationPolicy, VerificationRequest, VerificationRequestId,
};
use notes_identity::infrastructure::notification::EmailNotifier;
use notes_identity::infrastructure::persistence::{
    InMemoryAccountRepository, InMemoryVerificationRepository,
};

/// 让前 `parties` 次读取在屏障处会合，所有校验都基于同一份快照
struct SnapshotGate {
    inner: Arc<InMemoryVerificationRepository>,
    barrier: tokio::sync::Barrier,
    parties: usize,
    reads: AtomicUsize,
}

impl SnapshotGate {
    fn new(inner: Arc<InMemoryVerificationRepository>, parties: usize) -> Self {
        Self {
            inner,
            barrier: tokio::sync::Barrier::new(parties),
            parties,
            reads: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl VerificationRepository for SnapshotGate {
    async fn replace_pending(&self, request: &VerificationRequest) -> AppResult<()> {
        self.inner.replace_pending(request).await
    }

    async fn find_pending(
        &self,
        account_id: &AccountId,
        purpose: Purpose,
    ) -> AppResult<Option<VerificationRequest>> {
        let snapshot = self.inner.find_pending(account_id, purpose).await?;
        if self.reads.fetch_add(1, Ordering::SeqCst) < self.parties {
            self.barrier.wait().await;
        }
        Ok(snapshot)
    }

    async fn record_failed_attempt(
        &self,
        id: &VerificationRequestId,
        max_failed_attempts: u32,
    ) -> AppResult<Option<u32>> {
        self.inner.record_failed_attempt(id, max_failed_attempts).await
    }

    async fn consume(
        &self,
        id: &VerificationRequestId,
        now: DateTime<Utc>,
        max_failed_attempts: u32,
    ) -> AppResult<bool> {
        self.inner.consume(id, now, max_failed_attempts).await
    }

    async fn delete(&self, id: &VerificationRequestId) -> AppResult<()> {
        self.inner.delete(id).await
    }

    async fn count_issued_since(
        &self,
        account_id: &AccountId,
        purpose: Purpose,
        since: DateTime<Utc>,
    ) -> AppResult<u64> {
        self.inner.count_issued_since(account_id, purpose, since).await
    }

    async fn delete_expired_before(&self, cutoff: DateTime<Utc>) -> AppResult<u64> {
        self.inner.delete_expired_before(cutoff).await
    }
}

struct Fixture {
    clock: Arc<ManualClock>,
    accounts: Arc<InMemoryAccountRepository>,
    verifications: Arc<InMemoryVerificationRepository>,
    issuer: Arc<TokenIssuer>,
    validator: Arc<Validator>,
    account: Account,
}

async fn fixture() -> Fixture {
    let clock = Arc::new(ManualClock::new(t0()));
    let accounts = Arc::new(InMemoryAccountRepository::new());
    let verifications = Arc::new(InMemoryVerificationRepository::new());
    let policy = VerificationPolicy::default();

    let account = Account::register(
        Email::new("ann@example.com").unwrap(),
        HashedPassword::from_plain(PASSWORD).unwrap(),
        t0(),
    );
    accounts.save(&account).await.unwrap();

    let issuer = Arc::new(TokenIssuer::new(
        accounts.clone(),
        verifications.clone(),
        clock.clone(),
        policy.clone(),
    ));
    let validator = Arc::new(Validator::new(
        accounts.clone(),
        verifications.clone(),
        clock.clone(),
        policy,
    ));

    Fixture {
        clock,
        accounts,
        verifications,
        issuer,
        validator,
        account,
    }
}

impl Fixture {
    fn email(&self) -> Email {
        self.account.email.clone()
    }

    async fn verify(
        &self,
        purpose: Purpose,
        candidate: &str,
        mode: ValidationMode,
    ) -> Result<(), AuthError> {
        self.validator
            .verify(&self.email(), purpose, candidate, mode)
            .await
            .map(|_| ())
    }
}

#[tokio::test]
async fn code_validates_exactly_once_before_expiry() {
    let f = fixture().await;
    let issued = f.issuer.issue(&f.account, Purpose::EmailVerify).await.unwrap();
    assert_eq!(issued.secret.len(), 6);

    f.clock.advance(Duration::minutes(9));
    let verified = f
        .validator
        .verify(&f.email(), Purpose::EmailVerify, &issued.secret, ValidationMode::Consume)
        .await
        .unwrap();
    assert_eq!(verified.account.id, f.account.id);
    assert_eq!(verified.request.consumed_at, Some(t0() + Duration::minutes(9)));

    let again = f
        .verify(Purpose::EmailVerify, &issued.secret, ValidationMode::Consume)
        .await;
    assert!(matches!(again, Err(AuthError::NotFound)));
}

#[tokio::test]
async fn code_is_expired_at_the_boundary_whatever_the_candidate() {
    let f = fixture().await;
    let issued = f.issuer.issue(&f.account, Purpose::EmailVerify).await.unwrap();

    f.clock.advance(Duration::minutes(10));
    for candidate in [issued.secret.clone(), wrong_code(&issued.secret)] {
        let result = f
            .verify(Purpose::EmailVerify, &candidate, ValidationMode::Consume)
            .await;
        assert!(matches!(result, Err(AuthError::Expired)));
    }
}

#[tokio::test]
async fn code_submitted_after_eleven_minutes_is_expired() {
    let f = fixture().await;
    let issued = f.issuer.issue(&f.account, Purpose::EmailVerify).await.unwrap();

    f.clock.advance(Duration::minutes(11));
    let result = f
        .verify(Purpose::EmailVerify, &issued.secret, ValidationMode::Consume)
        .await;
    assert!(matches!(result, Err(AuthError::Expired)));
}

#[tokio::test]
async fn reissuing_supersedes_the_previous_code() {
    let f = fixture().await;
    let first = f.issuer.issue(&f.account, Purpose::EmailVerify).await.unwrap();
    let second = f.issuer.issue(&f.account, Purpose::EmailVerify).await.unwrap();

    let pending = f
        .verifications
        .find_pending(&f.account.id, Purpose::EmailVerify)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(pending.id, second.request.id);

    if first.secret != second.secret {
        let stale = f
            .verify(Purpose::EmailVerify, &first.secret, ValidationMode::Consume)
            .await;
        assert!(matches!(stale, Err(AuthError::Mismatch)));
    }

    f.verify(Purpose::EmailVerify, &second.secret, ValidationMode::Consume)
        .await
        .unwrap();
}

#[tokio::test]
async fn purposes_are_independent() {
    let f = fixture().await;
    let code = f.issuer.issue(&f.account, Purpose::EmailVerify).await.unwrap();
    let token = f.issuer.issue(&f.account, Purpose::PasswordReset).await.unwrap();

    // 重置令牌不能当作验证码使用
    let crossed = f
        .verify(Purpose::EmailVerify, &token.secret, ValidationMode::Peek)
        .await;
    assert!(matches!(crossed, Err(AuthError::Mismatch)));

    f.verify(Purpose::EmailVerify, &code.secret, ValidationMode::Consume)
        .await
        .unwrap();
    f.verify(Purpose::PasswordReset, &token.secret, ValidationMode::Consume)
        .await
        .unwrap();
}

#[tokio::test]
async fn attempts_are_locked_after_the_budget_is_spent() {
    let f = fixture().await;
    let issued = f.issuer.issue(&f.account, Purpose::EmailVerify).await.unwrap();
    let wrong = wrong_code(&issued.secret);

    for _ in 0..5 {
        let result = f
            .verify(Purpose::EmailVerify, &wrong, ValidationMode::Consume)
            .await;
        assert!(matches!(result, Err(AuthError::Mismatch)));
    }

    let locked = f
        .verify(Purpose::EmailVerify, &issued.secret, ValidationMode::Consume)
        .await;
    assert!(matches!(locked, Err(AuthError::TooManyAttempts)));

    // 重新签发后恢复
    let fresh = f.issuer.issue(&f.account, Purpose::EmailVerify).await.unwrap();
    f.verify(Purpose::EmailVerify, &fresh.secret, ValidationMode::Consume)
        .await
        .unwrap();
}

impl Fixture {
    /// 签发验证码并用掉除最后一次以外的全部尝试
    async fn issue_with_one_attempt_left(&self) -> String {
        let issued = self.issuer.issue(&self.account, Purpose::EmailVerify).await.unwrap();
        let wrong = wrong_code(&issued.secret);
        for _ in 0..4 {
            let result = self
                .verify(Purpose::EmailVerify, &wrong, ValidationMode::Peek)
                .await;
            assert!(matches!(result, Err(AuthError::Mismatch)));
        }
        issued.secret
    }

    /// 所有候选值基于同一份快照并发校验
    async fn verify_from_one_snapshot(
        &self,
        candidates: Vec<(String, ValidationMode)>,
    ) -> Vec<Result<(), AuthError>> {
        let gate = Arc::new(SnapshotGate::new(self.verifications.clone(), candidates.len()));
        let validator = Arc::new(Validator::new(
            self.accounts.clone(),
            gate,
            self.clock.clone(),
            VerificationPolicy::default(),
        ));

        let tasks: Vec<_> = candidates
            .into_iter()
            .map(|(candidate, mode)| {
                let validator = validator.clone();
                let email = self.email();
                tokio::spawn(async move {
                    validator
                        .verify(&email, Purpose::EmailVerify, &candidate, mode)
                        .await
                        .map(|_| ())
                })
            })
            .collect();

        futures::future::join_all(tasks)
            .await
            .into_iter()
            .map(|joined| joined.unwrap())
            .collect()
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn stale_snapshots_cannot_exceed_the_attempt_budget() {
    let f = fixture().await;
    let secret = f.issue_with_one_attempt_left().await;
    let wrong = wrong_code(&secret);

    let results = f
        .verify_from_one_snapshot(vec![(wrong, ValidationMode::Peek); 12])
        .await;

    let mismatches = results
        .iter()
        .filter(|r| matches!(r, Err(AuthError::Mismatch)))
        .count();
    assert_eq!(mismatches, 1);
    assert!(
        results
            .iter()
            .all(|r| matches!(r, Err(AuthError::Mismatch | AuthError::TooManyAttempts)))
    );

    let pending = f
        .verifications
        .find_pending(&f.account.id, Purpose::EmailVerify)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(pending.failed_attempts, 5);

    let locked = f
        .verify(Purpose::EmailVerify, &secret, ValidationMode::Consume)
        .await;
    assert!(matches!(locked, Err(AuthError::TooManyAttempts)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn correct_code_in_a_burst_shares_the_last_attempt() {
    let f = fixture().await;
    let secret = f.issue_with_one_attempt_left().await;
    let wrong = wrong_code(&secret);

    let mut candidates = vec![(wrong, ValidationMode::Peek); 8];
    candidates.push((secret, ValidationMode::Consume));
    let results = f.verify_from_one_snapshot(candidates).await;

    // 最后一次尝试只能被一个请求使用：要么一次不匹配，要么一次成功
    let evaluated = results
        .iter()
        .filter(|r| matches!(r, Ok(()) | Err(AuthError::Mismatch)))
        .count();
    assert_eq!(evaluated, 1);
    assert!(results.iter().all(|r| matches!(
        r,
        Ok(()) | Err(AuthError::Mismatch | AuthError::TooManyAttempts | AuthError::NotFound)
    )));

    let consumed = results[8].is_ok();
    let pending = f
        .verifications
        .find_pending(&f.account.id, Purpose::EmailVerify)
        .await
        .unwrap();
    match pending {
        Some(request) => {
            assert!(!consumed);
            assert_eq!(request.failed_attempts, 5);
        }
        None => assert!(consumed),
    }
}

#[tokio::test]
async fn peek_does_not_consume() {
    let f = fixture().await;
    let issued = f.issuer.issue(&f.account, Purpose::PasswordReset).await.unwrap();
    assert_eq!(issued.secret.len(), 64);

    f.clock.advance(Duration::minutes(5));
    for _ in 0..3 {
        f.verify(Purpose::PasswordReset, &issued.secret, ValidationMode::Peek)
            .await
            .unwrap();
    }

    f.clock.advance(Duration::minutes(1));
    f.verify(Purpose::PasswordReset, &issued.secret, ValidationMode::Consume)
        .await
        .unwrap();

    let after = f
        .verify(Purpose::PasswordReset, &issued.secret, ValidationMode::Peek)
        .await;
    assert!(matches!(after, Err(AuthError::NotFound)));
}

#[tokio::test]
async fn concurrent_consumes_succeed_exactly_once() {
    let f = fixture().await;
    let issued = f.issuer.issue(&f.account, Purpose::EmailVerify).await.unwrap();

    let tasks: Vec<_> = (0..16)
        .map(|_| {
            let validator = f.validator.clone();
            let email = f.email();
            let secret = issued.secret.clone();
            tokio::spawn(async move {
                validator
                    .verify(&email, Purpose::EmailVerify, &secret, ValidationMode::Consume)
                    .await
            })
        })
        .collect();

    let results = futures::future::join_all(tasks).await;
    let mut successes = 0;
    for result in results {
        match result.unwrap() {
            Ok(_) => successes += 1,
            Err(AuthError::NotFound) => {}
            Err(other) => panic!("unexpected error: {other}"),
        }
    }
    assert_eq!(successes, 1);
}

#[tokio::test]
async fn unknown_email_is_reported_per_role() {
    let f = fixture().await;
    let stranger = Email::new("nobody@example.com").unwrap();

    let issued = f.issuer.issue_for_email(&stranger, Purpose::PasswordReset).await;
    assert!(matches!(issued, Err(AuthError::UnknownAccount)));

    let verified = f
        .validator
        .verify(&stranger, Purpose::PasswordReset, "ff00", ValidationMode::Peek)
        .await;
    assert!(matches!(verified, Err(AuthError::NotFound)));
}

#[tokio::test]
async fn verified_account_gets_no_new_code_but_can_reset() {
    let f = fixture().await;
    let mut account = f.account.clone();
    account.mark_email_verified(t0());
    f.accounts
        .mark_email_verified(&account.id, t0())
        .await
        .unwrap();

    let code = f.issuer.issue(&account, Purpose::EmailVerify).await;
    assert!(matches!(code, Err(AuthError::AlreadyVerified)));

    f.issuer.issue(&account, Purpose::PasswordReset).await.unwrap();
}

#[tokio::test]
async fn issuance_is_throttled_per_hour() {
    let f = fixture().await;
    for _ in 0..5 {
        f.issuer.issue(&f.account, Purpose::PasswordReset).await.unwrap();
    }

    let throttled = f.issuer.issue(&f.account, Purpose::PasswordReset).await;
    assert!(matches!(throttled, Err(AuthError::RateLimited)));

    f.clock.advance(Duration::minutes(61));
    f.issuer.issue(&f.account, Purpose::PasswordReset).await.unwrap();
}

#[tokio::test]
async fn strict_delivery_failure_revokes_the_request() {
    let f = fixture().await;
    let sender = Arc::new(RecordingEmailSender::new());
    sender.set_failing(true);
    let notifier =
        Arc::new(EmailNotifier::new(sender.clone(), "Web Notes", RESET_BASE_URL).unwrap());
    let dispatcher = VerificationDispatcher::new(f.issuer.clone(), notifier, DeliveryPolicy::Strict);

    let result = dispatcher.dispatch(&f.account, Purpose::EmailVerify).await;
    assert!(matches!(result, Err(AuthError::TransportFailure(_))));

    let pending = f
        .verifications
        .find_pending(&f.account.id, Purpose::EmailVerify)
        .await
        .unwrap();
    assert!(pending.is_none());
    assert!(f.verifications.is_empty().await);
}

#[tokio::test]
async fn lenient_delivery_failure_keeps_the_request() {
    let f = fixture().await;
    let sender = Arc::new(RecordingEmailSender::new());
    sender.set_failing(true);
    let notifier =
        Arc::new(EmailNotifier::new(sender.clone(), "Web Notes", RESET_BASE_URL).unwrap());
    let dispatcher =
        VerificationDispatcher::new(f.issuer.clone(), notifier, DeliveryPolicy::Lenient);

    dispatcher
        .dispatch(&f.account, Purpose::EmailVerify)
        .await
        .unwrap();

    let pending = f
        .verifications
        .find_pending(&f.account.id, Purpose::EmailVerify)
        .await
        .unwrap();
    assert!(pending.is_some());
}
