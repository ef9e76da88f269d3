//! Stage 2: normalize one raw token (or model-proposed value) into a
//! validated non-negative number.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::ExtractError;

macro_rules! re {
    ($name:ident, $pat:expr) => {
        fn $name() -> &'static Regex {
            static R: OnceLock<Regex> = OnceLock::new();
            R.get_or_init(|| Regex::new($pat).expect("invalid regex"))
        }
    };
}

re!(re_currency_word, r"(?i)\b(?:usd|inr|eur|gbp|rs\.?|dollar|rupee|euro|pound)s?\b");

/// Clean a single token and parse it as an amount.
///
/// Total-or-reject: garbage never becomes zero, it becomes
/// `InvalidAmount`. Zero itself is legitimate (zero-value discounts).
/// Idempotent — a canonical numeric string cleans to itself.
pub fn clean_amount(raw: &str) -> Result<f64, ExtractError> {
    let invalid = || ExtractError::InvalidAmount(raw.to_string());

    let stripped: String = re_currency_word()
        .replace_all(raw, "")
        .chars()
        .filter(|c| !matches!(c, '₹' | '$' | '€' | '£' | '¥' | '¢' | '¤'))
        .filter(|c| !c.is_whitespace() && *c != ',')
        .collect();

    // The minus sign survives to here exactly so we can reject it:
    // repaired garbage must never flip into a silent positive.
    if stripped.starts_with('-') {
        return Err(invalid());
    }

    // Digit-confusion repair is for digits mangled inside a number;
    // a token with no real digit at all is words, not an amount.
    if !stripped.chars().any(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }

    let repaired: String = stripped
        .chars()
        .map(|c| match c {
            'l' | 'I' => '1',
            'O' => '0',
            'S' => '5',
            'Z' => '2',
            'B' => '8',
            other => other,
        })
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();

    let value: f64 = repaired.parse().map_err(|_| invalid())?;
    if !value.is_finite() || value < 0.0 {
        return Err(invalid());
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_number_passes_through() {
        assert_eq!(clean_amount("745.00").unwrap(), 745.0);
        assert_eq!(clean_amount("1902.05").unwrap(), 1902.05);
    }

    #[test]
    fn strips_currency_symbols_and_words() {
        assert_eq!(clean_amount("₹ 1,234.56").unwrap(), 1234.56);
        assert_eq!(clean_amount("$99.99").unwrap(), 99.99);
        assert_eq!(clean_amount("Rs. 500").unwrap(), 500.0);
        assert_eq!(clean_amount("120 rupees").unwrap(), 120.0);
    }

    #[test]
    fn repairs_ocr_digit_confusions() {
        assert_eq!(clean_amount("l05.00").unwrap(), 105.0); // l → 1
        assert_eq!(clean_amount("1O5").unwrap(), 105.0); // O → 0
        assert_eq!(clean_amount("S5.Z0").unwrap(), 55.20); // S → 5, Z → 2
        assert_eq!(clean_amount("B9").unwrap(), 89.0); // B → 8
    }

    #[test]
    fn percent_suffix_is_dropped() {
        assert_eq!(clean_amount("9%").unwrap(), 9.0);
    }

    #[test]
    fn zero_is_accepted() {
        assert_eq!(clean_amount("0").unwrap(), 0.0);
        assert_eq!(clean_amount("0.00").unwrap(), 0.0);
    }

    #[test]
    fn negative_is_rejected() {
        assert!(clean_amount("-5.00").is_err());
        assert!(clean_amount("-0.01").is_err());
    }

    #[test]
    fn garbage_is_rejected_not_zeroed() {
        assert!(clean_amount("").is_err());
        assert!(clean_amount("total").is_err());
        assert!(clean_amount("1.2.3").is_err());
        assert!(clean_amount("...").is_err());
    }

    #[test]
    fn cleaning_is_idempotent() {
        for raw in ["745.00", "₹ 1,234.56", "l05", "9%"] {
            let once = clean_amount(raw).unwrap();
            let twice = clean_amount(&once.to_string()).unwrap();
            assert_eq!(once, twice, "not idempotent for {raw}");
        }
    }
}
