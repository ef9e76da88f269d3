use async_trait::async_trait;

use crate::error::GenAiError;

/// Abstraction over a text-generation backend.
/// Implementations accept a prompt and return the raw reply text;
/// JSON recovery and retries happen in the calling layer.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, GenAiError>;
}

// ── Mock backend (always available, used for tests) ───────────────────────────

/// Returns a pre-set reply, or fails every call — lets pipeline tests
/// exercise both the model path and the fallback path without a
/// network.
pub struct MockGenerator {
    reply: Option<String>,
}

impl MockGenerator {
    pub fn replying(text: impl Into<String>) -> Self {
        Self { reply: Some(text.into()) }
    }

    /// A backend that fails every call, as if the service were down.
    pub fn unavailable() -> Self {
        Self { reply: None }
    }
}

#[async_trait]
impl TextGenerator for MockGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String, GenAiError> {
        match &self.reply {
            Some(text) => Ok(text.clone()),
            None => Err(GenAiError::EmptyResponse),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_returns_preset_reply() {
        let g = MockGenerator::replying("{\"ok\": true}");
        assert_eq!(g.generate("anything").await.unwrap(), "{\"ok\": true}");
    }

    #[tokio::test]
    async fn unavailable_mock_always_fails() {
        let g = MockGenerator::unavailable();
        assert!(matches!(
            g.generate("anything").await,
            Err(GenAiError::EmptyResponse)
        ));
    }
}
