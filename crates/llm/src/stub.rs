//! Deterministic generator for tests and offline runs.

use crate::TextGenerator;
use async_trait::async_trait;
use commerce_core::error::CommerceResult;

/// Returns the same canned text on every call.
pub struct StaticGenerator {
    response: String,
}

impl StaticGenerator {
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
        }
    }
}

#[async_trait]
impl TextGenerator for StaticGenerator {
    async fn generate(&self, _system_prompt: &str, _user_prompt: &str) -> CommerceResult<String> {
        Ok(self.response.clone())
    }
}
