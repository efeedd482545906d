//! 通知实现

pub mod email_notifier;

pub use email_notifier::*;
