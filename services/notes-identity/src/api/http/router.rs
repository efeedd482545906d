//! 路由

use axum::Router;
use axum::middleware;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

use super::handlers;
use super::security_headers::security_headers_middleware;
use super::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let auth = Router::new()
        .route("/register", post(handlers::register))
        .route("/login", post(handlers::login))
        .route("/verification/send", post(handlers::send_email_verification))
        .route("/verification/verify", post(handlers::verify_email))
        .route("/password/forgot", post(handlers::forgot_password))
        .route("/password/check", post(handlers::check_reset_token))
        .route("/password/reset", post(handlers::reset_password));

    Router::new()
        .nest("/api/auth", auth)
        .route("/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics))
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
