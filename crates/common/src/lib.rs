//! notes-common - 通用类型和工具库

pub mod clock;
pub mod health;
pub mod types;

pub use clock::*;
pub use health::*;
pub use types::*;
