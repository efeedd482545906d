//! 命令

mod login_command;
mod register_command;
mod request_password_reset_command;
mod reset_password_command;
mod send_email_verification_command;
mod verify_email_command;

pub use login_command::*;
pub use register_command::*;
pub use request_password_reset_command::*;
pub use reset_password_command::*;
pub use send_email_verification_command::*;
pub use verify_email_command::*;
