//! Query trait 定义

use async_trait::async_trait;
use notes_errors::AppError;

/// Query trait
pub trait Query: Send + Sync {
    type Result: Send;
    type Error: From<AppError> + Send;
}

/// Query Handler trait
#[async_trait]
pub trait QueryHandler<Q: Query + 'static>: Send + Sync {
    async fn handle(&self, query: Q) -> Result<Q::Result, Q::Error>;
}
