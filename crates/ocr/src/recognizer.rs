use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RecognizeError {
    #[error("request to text-recognition backend failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("text-recognition backend error: {0}")]
    Backend(String),
}

/// Text recognized from a bill image, with the backend's own
/// confidence in the recognition (not in any amount found later).
#[derive(Debug, Clone, PartialEq)]
pub struct RecognizedText {
    pub text: String,
    pub confidence: f32,
}

/// Abstraction over a text-recognition backend.
/// Implementations accept PNG/JPEG bytes; `Ok(None)` means the
/// backend ran fine but found no text at all.
#[async_trait]
pub trait TextRecognizer: Send + Sync {
    async fn recognize(&self, image_bytes: &[u8]) -> Result<Option<RecognizedText>, RecognizeError>;
}

// ── Mock backend (always available, used for tests) ───────────────────────────

/// Returns a pre-set string — lets the pipeline be tested end to end
/// without a cloud backend.
pub struct MockRecognizer {
    result: Option<RecognizedText>,
}

impl MockRecognizer {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            result: Some(RecognizedText { text: text.into(), confidence: 0.9 }),
        }
    }

    pub fn with_confidence(text: impl Into<String>, confidence: f32) -> Self {
        Self {
            result: Some(RecognizedText { text: text.into(), confidence }),
        }
    }

    /// A backend that detects no text, as on a blank or hopeless image.
    pub fn blank() -> Self {
        Self { result: None }
    }
}

#[async_trait]
impl TextRecognizer for MockRecognizer {
    async fn recognize(
        &self,
        _image_bytes: &[u8],
    ) -> Result<Option<RecognizedText>, RecognizeError> {
        Ok(self.result.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_returns_preset_text() {
        let r = MockRecognizer::new("TOTAL 45.00");
        let recognized = r.recognize(b"fake image data").await.unwrap().unwrap();
        assert_eq!(recognized.text, "TOTAL 45.00");
        assert_eq!(recognized.confidence, 0.9);
    }

    #[tokio::test]
    async fn blank_mock_detects_nothing() {
        let r = MockRecognizer::blank();
        assert!(r.recognize(b"anything").await.unwrap().is_none());
    }
}
