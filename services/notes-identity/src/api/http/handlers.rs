//! HTTP 处理函数

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use notes_common::AggregatedHealthResult;
use notes_cqrs_core::{CommandHandler, QueryHandler};

use super::dto::{
    ApiResponse, CheckResetTokenRequest, EmailRequest, LoginData, LoginRequest, RegisterRequest,
    ResetPasswordRequest, VerifyEmailRequest,
};
use super::state::AppState;
use crate::application::commands::{
    LoginCommand, RegisterCommand, RequestPasswordResetCommand, ResetPasswordCommand,
    SendEmailVerificationCommand, VerifyEmailCommand,
};
use crate::application::queries::CheckResetTokenQuery;
use crate::error::AuthError;

type ApiResult<T = ()> = Result<Json<ApiResponse<T>>, AuthError>;

pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult {
    let Json(req) = payload?;
    state
        .register
        .handle(RegisterCommand {
            email: req.email,
            password: req.password,
        })
        .await?;
    Ok(Json(ApiResponse::success()))
}

pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<LoginData> {
    let Json(req) = payload?;
    let result = state
        .login
        .handle(LoginCommand {
            email: req.email,
            password: req.password,
        })
        .await?;
    Ok(Json(ApiResponse::with_data(LoginData {
        account_id: result.account_id,
        email_verified: result.email_verified,
    })))
}

pub async fn send_email_verification(
    State(state): State<AppState>,
    payload: Result<Json<EmailRequest>, JsonRejection>,
) -> ApiResult {
    let Json(req) = payload?;
    state
        .send_email_verification
        .handle(SendEmailVerificationCommand { email: req.email })
        .await?;
    Ok(Json(ApiResponse::success()))
}

pub async fn verify_email(
    State(state): State<AppState>,
    payload: Result<Json<VerifyEmailRequest>, JsonRejection>,
) -> ApiResult {
    let Json(req) = payload?;
    state
        .verify_email
        .handle(VerifyEmailCommand {
            email: req.email,
            code: req.code,
        })
        .await?;
    Ok(Json(ApiResponse::success()))
}

pub async fn forgot_password(
    State(state): State<AppState>,
    payload: Result<Json<EmailRequest>, JsonRejection>,
) -> ApiResult {
    let Json(req) = payload?;
    state
        .request_password_reset
        .handle(RequestPasswordResetCommand { email: req.email })
        .await?;
    Ok(Json(ApiResponse::success()))
}

pub async fn check_reset_token(
    State(state): State<AppState>,
    payload: Result<Json<CheckResetTokenRequest>, JsonRejection>,
) -> ApiResult {
    let Json(req) = payload?;
    state
        .check_reset_token
        .handle(CheckResetTokenQuery {
            email: req.email,
            token: req.token,
        })
        .await?;
    Ok(Json(ApiResponse::success()))
}

pub async fn reset_password(
    State(state): State<AppState>,
    payload: Result<Json<ResetPasswordRequest>, JsonRejection>,
) -> ApiResult {
    let Json(req) = payload?;
    state
        .reset_password
        .handle(ResetPasswordCommand {
            email: req.email,
            token: req.token,
            new_password: req.new_password,
        })
        .await?;
    Ok(Json(ApiResponse::success()))
}

/// 存活 + 存储健康检查
pub async fn health(State(state): State<AppState>) -> Response {
    let result = AggregatedHealthResult::collect(&state.health_checks).await;
    let status = if result.healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(result)).into_response()
}

/// Prometheus 指标
pub async fn metrics(State(state): State<AppState>) -> Response {
    match &state.metrics {
        Some(handle) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        )
            .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
