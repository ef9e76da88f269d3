//! Stage 1: turn raw recognized text into numeric-looking tokens plus
//! a currency hint and an extraction confidence score.

use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;
use tally_core::Currency;

use crate::error::ExtractError;

// ── Compiled regex cache ─────────────────────────────────────────────────────

macro_rules! re {
    ($name:ident, $pat:expr) => {
        fn $name() -> &'static Regex {
            static R: OnceLock<Regex> = OnceLock::new();
            R.get_or_init(|| Regex::new($pat).expect("invalid regex"))
        }
    };
}

// Currency canonicalization. OCR renders ₹ as "Rs", "R5", "P5", or a
// lone 7/１/3; ISO codes trail the digits they qualify.
re!(re_rs_marker, r"(?i)\b(?:rs|r5|p5)\.?\s*(\d)");
re!(re_inr_after, r"(?i)(\d)\s*inr\b");
re!(re_usd_after, r"(\d)\s*USD\b");
re!(re_eur_after, r"(\d)\s*EUR\b");
re!(re_gbp_after, r"(\d)\s*GBP\b");
// A misread ₹ only counts when separated from the digits — the 7 in
// "1745.00" must stay a 7.
re!(re_misread_rupee, r"(^|[\s:])[7１3]\s+(\d{2,})");
re!(re_thousands, r"(\d)[,\s](\d{3})([^\d]|$)");
re!(re_sym_digit, r"([₹$€£])\s*(\d)");
re!(re_digit_sym, r"(\d)\s*([₹$€£])");

// Token scan and discard rules.
re!(re_token, r"\d+(?:\.\d+)?%?");
re!(re_date_span, r"\b\d{1,4}[-/]\d{1,2}[-/]\d{1,4}\b");
re!(re_phone, r"^\d{10,}$");
re!(re_year, r"^(?:19|20)\d{2}$");

// Currency hints, in detection priority order.
re!(re_usd_hint, r"(?i)\$|\busd\b|dollar");
re!(re_inr_hint, r"(?i)₹|\binr\b|\brs\b|\brs\.|rupee");
re!(re_eur_hint, r"(?i)€|\beur\b|euro");
re!(re_gbp_hint, r"(?i)£|\bgbp\b|pound");

re!(re_billing_keyword,
    r"(?i)total|amount|paid|due|balance|discount|gross|bill|payable|charges|fee|tax|gst|shipping|handling|delivery|mrp|subtotal|invoice");

// ── Confidence weights ───────────────────────────────────────────────────────

const WEIGHT_TOKENS: f64 = 0.4;
const WEIGHT_CURRENCY: f64 = 0.3;
const WEIGHT_KEYWORDS: f64 = 0.3;
const SHORT_TEXT_LEN: usize = 10;
const MIN_CONFIDENCE: f64 = 0.3;

/// Output of the token extraction stage.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TokenExtraction {
    pub raw_tokens: Vec<String>,
    pub currency_hint: Currency,
    pub confidence: f64,
}

/// Canonicalize currency markers and collapse thousands separators so
/// the token scan sees clean `123.45` shapes.
pub fn normalize(text: &str) -> String {
    let text = re_rs_marker().replace_all(text, "₹ ${1}");
    let text = re_inr_after().replace_all(&text, "${1} ₹");
    let text = re_misread_rupee().replace_all(&text, "${1}₹ ${2}");
    let text = re_usd_after().replace_all(&text, "${1} $$");
    let text = re_eur_after().replace_all(&text, "${1} €");
    let text = re_gbp_after().replace_all(&text, "${1} £");
    let text = collapse_thousands(&text);
    let text = re_sym_digit().replace_all(&text, "${1} ${2}");
    re_digit_sym().replace_all(&text, "${1} ${2}").into_owned()
}

fn collapse_thousands(text: &str) -> String {
    let mut current = text.to_string();
    loop {
        let next = re_thousands()
            .replace_all(&current, "${1}${2}${3}")
            .into_owned();
        if next == current {
            return current;
        }
        current = next;
    }
}

/// Scan normalized text for amount-like tokens. Returns the terminal
/// "document too noisy" failure when nothing numeric survives or the
/// evidence is too weak; callers must not retry it.
pub fn extract(text: &str) -> Result<TokenExtraction, ExtractError> {
    if text.trim().is_empty() {
        return Err(ExtractError::too_noisy());
    }

    // Blank out date spans so their components never read as amounts.
    let scannable = re_date_span().replace_all(text, " ");

    let raw_tokens: Vec<String> = re_token()
        .find_iter(&scannable)
        .filter(|m| standalone(&scannable, m.start(), m.end()))
        .map(|m| m.as_str().to_string())
        .filter(|t| keep_token(t))
        .collect();

    let (currency_hint, has_currency) = detect_currency(text);
    let has_keywords = re_billing_keyword().is_match(text);

    let mut confidence = 0.0;
    if !raw_tokens.is_empty() {
        confidence += WEIGHT_TOKENS;
    }
    if has_currency {
        confidence += WEIGHT_CURRENCY;
    }
    if has_keywords {
        confidence += WEIGHT_KEYWORDS;
    }
    if text.chars().count() <= SHORT_TEXT_LEN {
        confidence *= 0.5;
    }
    let confidence = round2(confidence);

    if confidence < MIN_CONFIDENCE || raw_tokens.is_empty() {
        return Err(ExtractError::too_noisy());
    }

    Ok(TokenExtraction { raw_tokens, currency_hint, confidence })
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// The regex crate has no word boundaries around an arbitrary match,
/// so reject tokens glued to letters or digits (serial numbers,
/// version strings).
fn standalone(text: &str, start: usize, end: usize) -> bool {
    let before = text[..start].chars().next_back();
    let after = text[end..].chars().next();
    !before.is_some_and(|c| c.is_alphanumeric()) && !after.is_some_and(|c| c.is_alphanumeric())
}

fn keep_token(token: &str) -> bool {
    if re_phone().is_match(token) {
        return false;
    }

    let bare = token.trim_end_matches('%');
    // Long undotted digit runs read like invoice numbers or PINs.
    if !bare.contains('.') && bare.len() >= 5 {
        return false;
    }
    if re_year().is_match(bare) {
        return false;
    }

    let Ok(value) = bare.parse::<f64>() else {
        return false;
    };
    if value < 0.1 || value > 50_000.0 {
        return false;
    }
    // A lone single digit is a quantity, not an amount.
    if token.len() == 1 && value < 10.0 {
        return false;
    }
    // A sub-1 decimal is a stray ratio.
    if value < 1.0 && bare.contains('.') {
        return false;
    }
    true
}

fn detect_currency(text: &str) -> (Currency, bool) {
    if re_usd_hint().is_match(text) {
        (Currency::Usd, true)
    } else if re_inr_hint().is_match(text) {
        (Currency::Inr, true)
    } else if re_eur_hint().is_match(text) {
        (Currency::Eur, true)
    } else if re_gbp_hint().is_match(text) {
        (Currency::Gbp, true)
    } else {
        (Currency::default(), false)
    }
}
