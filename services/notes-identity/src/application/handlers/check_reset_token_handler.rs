//! 检查重置令牌处理器

use std::sync::Arc;

use async_trait::async_trait;
use notes_cqrs_core::QueryHandler;

use crate::application::queries::CheckResetTokenQuery;
use crate::domain::services::{ValidationMode, Validator};
use crate::domain::value_objects::Email;
use crate::domain::verification::Purpose;
use crate::error::AuthError;
use crate::infrastructure::metrics;

pub struct CheckResetTokenHandler {
    validator: Arc<Validator>,
}

impl CheckResetTokenHandler {
    pub fn new(validator: Arc<Validator>) -> Self {
        Self { validator }
    }
}

#[async_trait]
impl QueryHandler<CheckResetTokenQuery> for CheckResetTokenHandler {
    async fn handle(&self, query: CheckResetTokenQuery) -> Result<(), AuthError> {
        let email = Email::new(&query.email)?;

        let result = self
            .validator
            .verify(&email, Purpose::PasswordReset, &query.token, ValidationMode::Peek)
            .await;
        metrics::record_validation(Purpose::PasswordReset, &result);

        result.map(|_| ())
    }
}
