//! Command trait 定义

use async_trait::async_trait;
use notes_errors::AppError;

/// Command trait
///
/// `Error` 允许处理器返回业务错误码，同时必须能承接基础设施层的 `AppError`。
pub trait Command: Send + Sync {
    type Result: Send;
    type Error: From<AppError> + Send;
}

/// Command Handler trait
#[async_trait]
pub trait CommandHandler<C: Command + 'static>: Send + Sync {
    async fn handle(&self, command: C) -> Result<C::Result, C::Error>;
}
