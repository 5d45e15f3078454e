//! Language-model provider trait for answer synthesis.

use async_trait::async_trait;

use crate::error::Result;

/// A provider that completes a prompt with a text response.
///
/// The core treats completion as a synchronous request/response exchange:
/// one prompt in, one answer out, no streaming and no conversation state.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Complete the prompt at the given sampling temperature.
    async fn complete(&self, prompt: &str, temperature: f32) -> Result<String>;
}
