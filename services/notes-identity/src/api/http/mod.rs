//! HTTP 接口（axum）

pub mod dto;
pub mod error;
pub mod handlers;
pub mod router;
pub mod security_headers;
pub mod state;

pub use router::build_router;
pub use state::AppState;
