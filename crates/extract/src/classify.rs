//! Stage 5: assign a billing category to each candidate amount.
//!
//! The model path sends candidates, detected terms, and the document
//! text to the generation backend and validates whatever comes back.
//! Any backend failure, or a reply with zero valid entries, drops to a
//! deterministic keyword rule engine. Classification itself never
//! fails; an empty result is a legitimate outcome.

use serde_json::Value;
use tally_core::{AmountKind, ClassifiedAmount};
use tally_genai::{request_json, RetryPolicy, TextGenerator};
use tracing::{debug, warn};

use crate::terms::DetectedTerms;

const MODEL_DEFAULT_CONFIDENCE: f64 = 0.8;
const FALLBACK_CONFIDENCE: f64 = 0.6;
const FALLBACK_TOP_N: usize = 5;

/// Classified amounts plus the classifier's own confidence in them.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub amounts: Vec<ClassifiedAmount>,
    pub confidence: f64,
}

/// Classify the candidate set, preferring the model and falling back
/// to keyword rules on any backend trouble.
pub async fn classify<G: TextGenerator + ?Sized>(
    generator: &G,
    retry: &RetryPolicy,
    candidates: &[f64],
    text: &str,
) -> Classification {
    let terms = DetectedTerms::detect(text);
    let prompt = build_prompt(candidates, &terms, text);

    match request_json(generator, retry, &prompt).await {
        Ok(reply) => {
            let classification = validate_reply(&reply, candidates);
            if classification.amounts.is_empty() {
                warn!("model reply held no valid classifications, using rules");
                fallback(candidates, text)
            } else {
                classification
            }
        }
        Err(err) => {
            warn!(error = %err, "classification backend unavailable, using rules");
            fallback(candidates, text)
        }
    }
}

fn build_prompt(candidates: &[f64], terms: &DetectedTerms, text: &str) -> String {
    let listed = candidates
        .iter()
        .map(|v| format!("{v:.2}"))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "You are classifying monetary amounts found on a bill or invoice.\n\
         Candidate amounts: [{listed}]\n\
         Billing terms present in the document: {}\n\n\
         Document text:\n{text}\n\n\
         Assign each candidate one of these types where the document supports it: \
         total, subtotal, tax, due, other_charges. \
         Omit candidates you cannot place. Reply with ONLY a JSON object shaped as \
         {{\"amounts\": [{{\"type\": \"total\", \"value\": 123.45}}], \"confidence\": 0.9}} \
         and nothing else.",
        terms.summary()
    )
}

/// Keep only entries whose type parses and whose value is one of the
/// candidates (the model must label, never invent).
fn validate_reply(reply: &Value, candidates: &[f64]) -> Classification {
    let amounts: Vec<ClassifiedAmount> = reply["amounts"]
        .as_array()
        .map(|entries| {
            entries
                .iter()
                .filter_map(|entry| {
                    let kind: AmountKind = entry["type"].as_str()?.parse().ok()?;
                    let value = entry["value"].as_f64()?;
                    if value < 0.0 || !candidates.iter().any(|&c| (c - value).abs() < 0.005) {
                        return None;
                    }
                    Some(ClassifiedAmount::new(kind, value))
                })
                .collect()
        })
        .unwrap_or_default();

    let confidence = reply["confidence"]
        .as_f64()
        .filter(|c| (0.0..=1.0).contains(c))
        .unwrap_or(MODEL_DEFAULT_CONFIDENCE);

    Classification { amounts, confidence }
}

/// Rule engine: take the largest candidates, find the document line
/// each appears on, and label it from the line's keywords. Amounts
/// whose line carries no billing keyword are dropped.
pub fn fallback(candidates: &[f64], text: &str) -> Classification {
    let mut top: Vec<f64> = candidates.to_vec();
    top.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));
    top.truncate(FALLBACK_TOP_N);

    let amounts = top
        .into_iter()
        .filter_map(|value| {
            let line = find_line(text, value)?;
            let (kind, rule_confidence) = match_rule(&line)?;
            debug!(%value, ?kind, rule_confidence, line, "rule classification");
            Some(ClassifiedAmount::new(kind, value))
        })
        .collect();

    Classification { amounts, confidence: FALLBACK_CONFIDENCE }
}

/// Locate the line an amount appears on, matching both the two-decimal
/// rendering and the shortest one.
fn find_line(text: &str, value: f64) -> Option<String> {
    let two_decimals = format!("{value:.2}");
    let plain = value.to_string();
    text.lines()
        .find(|line| line.contains(&two_decimals) || line.contains(&plain))
        .map(|line| line.trim().to_string())
}

/// Keyword rules in priority order. The returned weight is only
/// logged; the fallback reports one overall confidence.
fn match_rule(line: &str) -> Option<(AmountKind, f64)> {
    let lower = line.to_lowercase();
    let has = |needle: &str| lower.contains(needle);

    if has("mrp") {
        Some((AmountKind::Mrp, 0.8))
    } else if has("service")
        || has("registration")
        || has("room")
        || has("consult")
        || has("procedure")
        || has("check up")
        || has("examination")
    {
        Some((AmountKind::OtherCharges, 0.8))
    } else if has("due") {
        Some((AmountKind::Due, 0.9))
    } else if has("discount") || has("saving") {
        Some((AmountKind::Discount, 0.8))
    } else if has("sub total") || has("subtotal") {
        Some((AmountKind::Subtotal, 0.9))
    } else if has("total") {
        Some((AmountKind::Total, 0.9))
    } else if has("paid") {
        Some((AmountKind::Paid, 0.9))
    } else if has("balance") {
        Some((AmountKind::Balance, 0.9))
    } else if has("tax") || has("gst") {
        Some((AmountKind::Tax, 0.7))
    } else if has("charge") {
        Some((AmountKind::Charges, 0.7))
    } else {
        None
    }
}
