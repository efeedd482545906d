//! 查询

mod check_reset_token_query;

pub use check_reset_token_query::*;
