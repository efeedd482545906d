//! 命令 / 查询处理器

mod check_reset_token_handler;
mod login_handler;
mod register_handler;
mod request_password_reset_handler;
mod reset_password_handler;
mod send_email_verification_handler;
mod verify_email_handler;

pub use check_reset_token_handler::*;
pub use login_handler::*;
pub use register_handler::*;
pub use request_password_reset_handler::*;
pub use reset_password_handler::*;
pub use send_email_verification_handler::*;
pub use verify_email_handler::*;
