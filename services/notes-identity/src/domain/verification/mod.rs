//! 验证请求：验证码 / 重置令牌的签发与校验模型

pub mod policy;
pub mod purpose;
pub mod secret;
pub mod verification_request;

pub use policy::*;
pub use purpose::*;
pub use verification_request::*;
