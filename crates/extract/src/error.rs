use thiserror::Error;

/// Core extraction failures.
///
/// Backend trouble (`tally_genai::GenAiError`) is absorbed where a
/// fallback exists — a failed normalization call leaves the locally
/// cleaned tokens, a failed classification call drops to the rule
/// engine — so only genuinely terminal outcomes surface here.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The document has no recognizable amounts. Terminal for the
    /// request, but not a bug; surfaced as a 4xx-style outcome.
    #[error("no amounts found: {reason}")]
    NoAmountsFound { reason: String },

    /// One token failed cleaning. Local; the caller drops the token.
    #[error("invalid amount after cleaning: '{0}'")]
    InvalidAmount(String),

    /// Aggregation filtered every candidate away. Terminal.
    #[error("no valid amounts survived aggregation")]
    NoValidAmounts,
}

impl ExtractError {
    fn no_amounts(reason: &str) -> Self {
        ExtractError::NoAmountsFound { reason: reason.to_string() }
    }

    /// The token stream was empty or confidence fell below threshold.
    pub fn too_noisy() -> Self {
        Self::no_amounts("document too noisy")
    }

    /// The recognition backend detected no text at all.
    pub fn ocr_empty() -> Self {
        Self::no_amounts("OCR failed to extract text")
    }
}

/// Failures of a full pipeline run, including the stages that touch
/// the external collaborators.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("image preprocessing failed: {0}")]
    Preprocess(#[from] tally_ocr::PreprocessError),
    #[error("text recognition failed: {0}")]
    Recognize(#[from] tally_ocr::RecognizeError),
    #[error(transparent)]
    Extract(#[from] ExtractError),
}

impl PipelineError {
    /// Whether this outcome is the document's fault rather than the
    /// service's. Callers map these to a client error, not a 500.
    pub fn is_no_amounts(&self) -> bool {
        matches!(
            self,
            PipelineError::Extract(
                ExtractError::NoAmountsFound { .. } | ExtractError::NoValidAmounts
            )
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_amounts_classification_covers_both_terminal_kinds() {
        assert!(PipelineError::from(ExtractError::too_noisy()).is_no_amounts());
        assert!(PipelineError::from(ExtractError::NoValidAmounts).is_no_amounts());
        assert!(!PipelineError::from(ExtractError::InvalidAmount("x".into())).is_no_amounts());
    }

    #[test]
    fn messages_are_user_presentable() {
        assert_eq!(
            ExtractError::too_noisy().to_string(),
            "no amounts found: document too noisy"
        );
        assert_eq!(
            ExtractError::ocr_empty().to_string(),
            "no amounts found: OCR failed to extract text"
        );
    }
}
