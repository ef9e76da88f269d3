use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("failed to parse policy TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid policy: {0}")]
    Invalid(String),
}

/// An inclusive value band that a candidate amount may fall into.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Band {
    pub min: f64,
    pub max: f64,
}

impl Band {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Tunable policy for the candidate aggregation stage.
///
/// The defaults were tuned against hospital bills (many mid-range
/// service charges, occasional zero-value discounts). Other document
/// families can load their own bands from TOML instead of patching
/// the code.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CandidatePolicy {
    /// Hard lower bound; anything below is noise.
    pub range_min: f64,
    /// Hard upper bound; anything above is an invoice number or PIN.
    pub range_max: f64,
    /// Two amounts closer than this fraction of the larger one are
    /// considered the same amount seen twice.
    pub dedup_tolerance: f64,
    /// Value bands a surviving candidate must fall into.
    pub bands: Vec<Band>,
    /// Maximum number of candidates handed to classification.
    pub max_candidates: usize,
}

impl Default for CandidatePolicy {
    fn default() -> Self {
        Self {
            range_min: 0.01,
            range_max: 100_000.0,
            dedup_tolerance: 0.01,
            bands: vec![
                Band::new(0.0, 1.0),
                Band::new(1.0, 50.0),
                Band::new(50.0, 10_000.0),
            ],
            max_candidates: 8,
        }
    }
}

impl CandidatePolicy {
    pub fn from_toml(content: &str) -> Result<Self, PolicyError> {
        let policy: CandidatePolicy = toml::from_str(content)?;
        policy.validate()?;
        Ok(policy)
    }

    fn validate(&self) -> Result<(), PolicyError> {
        if self.range_min > self.range_max {
            return Err(PolicyError::Invalid(format!(
                "range_min {} exceeds range_max {}",
                self.range_min, self.range_max
            )));
        }
        if !(0.0..1.0).contains(&self.dedup_tolerance) {
            return Err(PolicyError::Invalid(format!(
                "dedup_tolerance {} must be in [0, 1)",
                self.dedup_tolerance
            )));
        }
        if self.max_candidates == 0 {
            return Err(PolicyError::Invalid("max_candidates must be > 0".into()));
        }
        Ok(())
    }

    pub fn in_range(&self, value: f64) -> bool {
        value >= self.range_min && value <= self.range_max
    }

    pub fn in_band(&self, value: f64) -> bool {
        self.bands.iter().any(|b| b.contains(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_bands_cover_bill_amounts() {
        let policy = CandidatePolicy::default();
        assert!(policy.in_band(0.0)); // zero-value discount
        assert!(policy.in_band(25.0)); // co-pay
        assert!(policy.in_band(1902.05)); // bill total
        assert!(!policy.in_band(25_000.0)); // outlier
    }

    #[test]
    fn default_range_excludes_noise() {
        let policy = CandidatePolicy::default();
        assert!(!policy.in_range(0.001));
        assert!(policy.in_range(0.01));
        assert!(policy.in_range(100_000.0));
        assert!(!policy.in_range(100_000.01));
    }

    #[test]
    fn loads_custom_bands_from_toml() {
        let policy = CandidatePolicy::from_toml(
            r#"
            range_max = 1000000.0
            max_candidates = 12

            [[bands]]
            min = 0.0
            max = 500000.0
            "#,
        )
        .unwrap();
        assert_eq!(policy.max_candidates, 12);
        assert!(policy.in_band(250_000.0));
        // Unset fields keep their defaults.
        assert_eq!(policy.dedup_tolerance, 0.01);
    }

    #[test]
    fn rejects_inverted_range() {
        let err = CandidatePolicy::from_toml("range_min = 10.0\nrange_max = 1.0");
        assert!(err.is_err());
    }

    #[test]
    fn rejects_zero_candidate_cap() {
        let err = CandidatePolicy::from_toml("max_candidates = 0");
        assert!(err.is_err());
    }
}
