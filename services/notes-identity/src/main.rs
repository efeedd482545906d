//! Web Notes 账户验证服务入口

use std::sync::Arc;
use std::time::Duration;

use notes_adapter_postgres::{PostgresConfig, PostgresHealthCheck, create_pool};
use notes_bootstrap::{init_runtime, shutdown_signal};
use notes_common::{Clock, HealthCheck, SystemClock};
use notes_config::AppConfig;
use notes_identity::api::http::build_router;
use notes_identity::domain::repositories::{AccountRepository, VerificationRepository};
use notes_identity::domain::services::DeliveryPolicy;
use notes_identity::domain::verification::VerificationPolicy;
use notes_identity::infrastructure::cleanup::CleanupTask;
use notes_identity::infrastructure::notification::EmailNotifier;
use notes_identity::infrastructure::persistence::{
    InMemoryAccountRepository, InMemoryVerificationRepository, PostgresAccountRepository,
    PostgresVerificationRepository, migrations,
};
use notes_identity::{ServiceDeps, build_state, select_email_sender};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load("config")?;
    init_runtime(&config);

    let metrics = if config.telemetry.metrics_enabled {
        Some(notes_telemetry::init_metrics()?)
    } else {
        None
    };

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let mut health_checks: Vec<Arc<dyn HealthCheck>> = Vec::new();

    let (accounts, verifications): (Arc<dyn AccountRepository>, Arc<dyn VerificationRepository>) =
        match &config.database {
            Some(db) => {
                let pool = create_pool(&PostgresConfig::from(db)).await?;
                migrations::run(&pool).await?;
                health_checks.push(Arc::new(PostgresHealthCheck::new(pool.clone())));
                info!("Using PostgreSQL repositories");
                let accounts: Arc<dyn AccountRepository> =
                    Arc::new(PostgresAccountRepository::new(pool.clone()));
                let verifications: Arc<dyn VerificationRepository> =
                    Arc::new(PostgresVerificationRepository::new(pool));
                (accounts, verifications)
            }
            None => {
                warn!("No database configured, using in-memory repositories");
                let accounts: Arc<dyn AccountRepository> = Arc::new(InMemoryAccountRepository::new());
                let verifications: Arc<dyn VerificationRepository> =
                    Arc::new(InMemoryVerificationRepository::new());
                (accounts, verifications)
            }
        };

    let sender = select_email_sender(&config)?;
    let notifier = Arc::new(EmailNotifier::new(
        sender,
        config.app_name.clone(),
        config.verification.reset_link_base_url.clone(),
    )?);
    let delivery = DeliveryPolicy::for_environment(config.is_production());
    info!(delivery = ?delivery, "Email delivery policy selected");

    let shutdown = CancellationToken::new();
    let cleanup = config.verification.cleanup_interval_secs.map(|secs| {
        Arc::new(CleanupTask::new(
            verifications.clone(),
            clock.clone(),
            Duration::from_secs(secs),
            chrono::Duration::hours(i64::from(config.verification.retention_hours)),
        ))
        .start(shutdown.clone())
    });

    let state = build_state(ServiceDeps {
        accounts,
        verifications,
        notifier,
        clock,
        policy: VerificationPolicy::from_config(&config.verification),
        delivery,
        health_checks,
        metrics,
    });
    let app = build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(addr = %addr, "HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    shutdown.cancel();
    if let Some(handle) = cleanup {
        handle.await?;
    }

    info!("Server stopped");
    Ok(())
}
