//! Driven port for free-text LLM generation used by receipt insights.

use async_trait::async_trait;

use super::define_port_error;

define_port_error! {
    /// Errors surfaced while generating insight text.
    pub enum InsightGeneratorError {
        /// Model provider could not be reached or failed.
        Unavailable { message: String } =>
            "insight generator unavailable: {message}",
        /// Model returned no usable text.
        EmptyResponse =>
            "insight generator returned no text",
    }
}

/// Port for prompt-in, text-out generation.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InsightGenerator: Send + Sync {
    /// Run `prompt` and return the model's raw text answer.
    async fn generate(&self, prompt: &str) -> Result<String, InsightGeneratorError>;
}

/// Fixture implementation that is always unavailable.
///
/// Services fall back to template insights when using it.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureInsightGenerator;

#[async_trait]
impl InsightGenerator for FixtureInsightGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String, InsightGeneratorError> {
        Err(InsightGeneratorError::unavailable("no model configured"))
    }
}
