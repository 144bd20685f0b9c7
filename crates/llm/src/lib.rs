//! Text-generation seam. The recommendation core only ever talks to the
//! `TextGenerator` trait; network-backed implementations live here so the
//! agents stay testable without network access.

pub mod openai;
pub mod stub;

use async_trait::async_trait;
use commerce_core::error::CommerceResult;

pub use openai::OpenAiGenerator;
pub use stub::StaticGenerator;

/// Narrow capability interface for LLM calls: a system prompt and a user
/// prompt in, generated text out. Used for category selection and
/// narration only — never for a recommendation decision that must be
/// reproducible.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, system_prompt: &str, user_prompt: &str) -> CommerceResult<String>;
}
