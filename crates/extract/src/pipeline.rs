//! Full detection pipeline: image preprocessing, text recognition,
//! and the six extraction stages, reported stage by stage.

use serde::Serialize;
use serde_json::Value;
use tally_core::{CandidatePolicy, ClassifiedAmount, Currency, FinalAmount};
use tally_genai::{request_json, GenAiError, RetryPolicy, TextGenerator};
use tally_ocr::{prepare_for_recognition, TextRecognizer};
use tracing::{debug, info, warn};

use crate::aggregate::{important_raw_amounts, Aggregator};
use crate::classify;
use crate::clean::clean_amount;
use crate::error::{ExtractError, PipelineError};
use crate::provenance;
use crate::tokens::{self, round2};

const NORMALIZE_DEFAULT_CONFIDENCE: f64 = 0.8;
const LOCAL_ONLY_CONFIDENCE: f64 = 0.6;

/// Token extraction stage as reported to callers.
#[derive(Debug, Clone, Serialize)]
pub struct OcrStage {
    pub raw_tokens: Vec<String>,
    pub currency_hint: Currency,
    pub confidence: f64,
}

/// Cleaned, aggregated candidate amounts.
#[derive(Debug, Clone, Serialize)]
pub struct NormalizationStage {
    pub normalized_amounts: Vec<f64>,
    pub normalization_confidence: f64,
}

/// Classified amounts plus classifier confidence.
#[derive(Debug, Clone, Serialize)]
pub struct ClassificationStage {
    pub amounts: Vec<ClassifiedAmount>,
    pub confidence: f64,
}

/// Final labeled amounts with their provenance.
#[derive(Debug, Clone, Serialize)]
pub struct FinalStage {
    pub currency: Currency,
    pub amounts: Vec<FinalAmount>,
    pub status: &'static str,
}

/// Every intermediate stage of one successful detection run.
#[derive(Debug, Clone, Serialize)]
pub struct DetectionReport {
    pub step1_ocr_extraction: OcrStage,
    pub step2_normalization: NormalizationStage,
    pub step3_classification: ClassificationStage,
    pub step4_final_output: FinalStage,
}

/// The detection pipeline with its two injected backends.
pub struct BillPipeline<R, G> {
    recognizer: R,
    generator: G,
    policy: CandidatePolicy,
    retry: RetryPolicy,
}

impl<R: TextRecognizer, G: TextGenerator> BillPipeline<R, G> {
    pub fn new(recognizer: R, generator: G, policy: CandidatePolicy) -> Self {
        Self { recognizer, generator, policy, retry: RetryPolicy::default() }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Run the whole pipeline on raw image bytes.
    pub async fn process_image(&self, image: &[u8]) -> Result<DetectionReport, PipelineError> {
        let prepared = prepare_for_recognition(image)?;
        let recognized = self.recognizer.recognize(&prepared).await?;
        let Some(recognized) = recognized else {
            return Err(ExtractError::ocr_empty().into());
        };
        info!(
            chars = recognized.text.chars().count(),
            confidence = recognized.confidence,
            "text recognized"
        );
        self.process_text(&recognized.text, Some(recognized.confidence))
            .await
    }

    /// Run the extraction stages on already-recognized text. The
    /// recognizer's own confidence, when known, scales the token
    /// extraction confidence.
    pub async fn process_text(
        &self,
        text: &str,
        recognizer_confidence: Option<f32>,
    ) -> Result<DetectionReport, PipelineError> {
        let normalized = tokens::normalize(text);
        let extraction = tokens::extract(&normalized)?;

        let confidence = match recognizer_confidence {
            Some(scale) => round2(extraction.confidence * f64::from(scale)),
            None => extraction.confidence,
        };
        let step1 = OcrStage {
            raw_tokens: extraction.raw_tokens.clone(),
            currency_hint: extraction.currency_hint,
            confidence,
        };
        debug!(tokens = step1.raw_tokens.len(), "tokens extracted");

        let cleaned: Vec<f64> = extraction
            .raw_tokens
            .iter()
            .filter_map(|token| clean_amount(token).ok())
            .collect();
        let important = important_raw_amounts(&extraction.raw_tokens);

        let (proposed, normalization_confidence) =
            self.propose_amounts(&extraction.raw_tokens, &important).await;

        let candidates = Aggregator::new(self.policy.clone())
            .aggregate(&cleaned, &proposed, &important)?;
        let step2 = NormalizationStage {
            normalized_amounts: candidates.clone(),
            normalization_confidence,
        };

        let classification =
            classify::classify(&self.generator, &self.retry, &candidates, &normalized).await;
        let step3 = ClassificationStage {
            amounts: classification.amounts.clone(),
            confidence: classification.confidence,
        };

        let amounts: Vec<FinalAmount> = classification
            .amounts
            .iter()
            .map(|classified| FinalAmount {
                kind: classified.kind,
                value: classified.value,
                source: format!(
                    "text: '{}'",
                    provenance::locate(classified.kind, classified.value, &normalized)
                ),
            })
            .collect();
        info!(amounts = amounts.len(), "detection complete");

        Ok(DetectionReport {
            step1_ocr_extraction: step1,
            step2_normalization: step2,
            step3_classification: step3,
            step4_final_output: FinalStage {
                currency: extraction.currency_hint,
                amounts,
                status: "ok",
            },
        })
    }

    /// Ask the model to normalize the raw tokens. Every proposal is
    /// re-cleaned locally; a dead backend leaves the local results to
    /// carry the run.
    async fn propose_amounts(&self, raw_tokens: &[String], important: &[f64]) -> (Vec<f64>, f64) {
        let prompt = normalization_prompt(raw_tokens, important);
        match request_json(&self.generator, &self.retry, &prompt).await {
            Ok(reply) => {
                let proposed = proposed_from_reply(&reply);
                let confidence = reply["confidence"]
                    .as_f64()
                    .filter(|c| (0.0..=1.0).contains(c))
                    .unwrap_or(NORMALIZE_DEFAULT_CONFIDENCE);
                (proposed, confidence)
            }
            Err(err @ GenAiError::Exhausted { .. }) => {
                warn!(error = %err, "normalization backend unavailable, using local cleaning");
                (Vec::new(), LOCAL_ONLY_CONFIDENCE)
            }
            Err(err) => {
                warn!(error = %err, "normalization reply unusable, using local cleaning");
                (Vec::new(), LOCAL_ONLY_CONFIDENCE)
            }
        }
    }
}

fn normalization_prompt(raw_tokens: &[String], important: &[f64]) -> String {
    let listed = raw_tokens.join(", ");
    let mandatory = important
        .iter()
        .map(|v| format!("{v:.2}"))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "These tokens were read off a bill by OCR and may contain digit \
         misreads (l for 1, O for 0, S for 5):\n[{listed}]\n\n\
         Return the plausible monetary amounts as numbers. Always include \
         these amounts if present: [{mandatory}]. Reply with ONLY a JSON \
         object shaped as {{\"amounts\": [123.45], \"confidence\": 0.9}}."
    )
}

/// Numbers or numeric strings from the reply's `amounts` array, each
/// pushed through the local cleaner so model output obeys the same
/// rules as OCR output.
fn proposed_from_reply(reply: &Value) -> Vec<f64> {
    reply["amounts"]
        .as_array()
        .map(|entries| {
            entries
                .iter()
                .filter_map(|entry| match entry {
                    Value::Number(n) => n.as_f64().map(|v| v.to_string()),
                    Value::String(s) => Some(s.clone()),
                    _ => None,
                })
                .filter_map(|raw| clean_amount(&raw).ok())
                .collect()
        })
        .unwrap_or_default()
}
