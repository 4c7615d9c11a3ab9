use async_trait::async_trait;
use recall_core::Result;
use serde::{Deserialize, Serialize};

/// Sampling knobs passed through to the backend. `None` means provider default.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationSettings {
    pub temperature: Option<f32>,
    pub max_output_tokens: Option<u32>,
}

/// Trait implemented by each text-generation backend.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Human-readable provider name, e.g. "gemini".
    fn name(&self) -> &str;

    /// Model the backend talks to.
    fn model(&self) -> &str;

    /// Generate a reply for a single prompt.
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Check if this backend is usable (credentials present, etc.).
    async fn health_check(&self) -> Result<()>;
}
