//! Stage 3: merge locally cleaned tokens with model-proposed amounts
//! into a deduplicated, range-filtered, bounded candidate set.

use tally_core::CandidatePolicy;

use crate::error::ExtractError;

/// Applies the candidate policy to the union of the three amount
/// sources. The "important raw amounts" set exists to guard against
/// the model dropping mid-range line items it was explicitly told to
/// keep.
pub struct Aggregator {
    policy: CandidatePolicy,
}

impl Aggregator {
    pub fn new(policy: CandidatePolicy) -> Self {
        Self { policy }
    }

    /// Union → range filter → sort descending → tolerance dedup →
    /// band filter → cap. An empty survivor set is terminal for the
    /// whole pipeline.
    pub fn aggregate(
        &self,
        cleaned: &[f64],
        proposed: &[f64],
        important: &[f64],
    ) -> Result<Vec<f64>, ExtractError> {
        let mut amounts: Vec<f64> = cleaned
            .iter()
            .chain(proposed)
            .chain(important)
            .copied()
            .filter(|&v| self.policy.in_range(v))
            .collect();

        amounts.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));

        let mut unique: Vec<f64> = Vec::with_capacity(amounts.len());
        for amount in amounts {
            if !unique.iter().any(|&kept| is_near(kept, amount, self.policy.dedup_tolerance)) {
                unique.push(amount);
            }
        }

        let mut survivors: Vec<f64> = unique
            .into_iter()
            .filter(|&v| self.policy.in_band(v))
            .collect();
        survivors.truncate(self.policy.max_candidates);

        if survivors.is_empty() {
            return Err(ExtractError::NoValidAmounts);
        }
        Ok(survivors)
    }
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new(CandidatePolicy::default())
    }
}

/// Two amounts closer than `tolerance` of the larger are the same
/// amount seen twice (OCR artifact or model echo).
fn is_near(a: f64, b: f64, tolerance: f64) -> bool {
    let larger = a.max(b);
    if larger == 0.0 {
        return true; // both zero
    }
    (a - b).abs() / larger < tolerance
}

/// Decimal-bearing raw tokens in [10, 1000] — the line items a bill
/// almost always prices with paise/cents. Fed both into the
/// normalization prompt ("mandatory inclusions") and straight into
/// aggregation.
pub fn important_raw_amounts(raw_tokens: &[String]) -> Vec<f64> {
    raw_tokens
        .iter()
        .filter(|t| t.contains('.'))
        .filter_map(|t| t.parse::<f64>().ok())
        .filter(|&v| (10.0..=1000.0).contains(&v))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_core::Band;

    #[test]
    fn near_duplicates_keep_only_the_larger() {
        let survivors = Aggregator::default()
            .aggregate(&[745.0, 745.5], &[], &[])
            .unwrap();
        // |745.5 - 745.0| / 745.5 ≈ 0.00067 < 1%.
        assert_eq!(survivors, vec![745.5]);
    }

    #[test]
    fn distinct_amounts_all_survive_sorted_descending() {
        let survivors = Aggregator::default()
            .aggregate(&[745.0, 1902.05], &[157.05], &[1000.0])
            .unwrap();
        assert_eq!(survivors, vec![1902.05, 1000.0, 745.0, 157.05]);
    }

    #[test]
    fn never_more_than_the_candidate_cap() {
        let many: Vec<f64> = (1..100).map(|i| 50.0 + (i as f64) * 37.0).collect();
        let survivors = Aggregator::default().aggregate(&many, &[], &[]).unwrap();
        assert_eq!(survivors.len(), 8);
        // Highest-value-first truncation.
        assert!(survivors.windows(2).all(|w| w[0] > w[1]));
    }

    #[test]
    fn out_of_range_values_are_dropped() {
        let survivors = Aggregator::default()
            .aggregate(&[0.001, 250_000.0, 745.0], &[], &[])
            .unwrap();
        assert_eq!(survivors, vec![745.0]);
    }

    #[test]
    fn band_filter_drops_outliers() {
        // 25 000 is in range but outside every band.
        let survivors = Aggregator::default()
            .aggregate(&[25_000.0, 745.0], &[], &[])
            .unwrap();
        assert_eq!(survivors, vec![745.0]);
    }

    #[test]
    fn empty_survivor_set_is_terminal() {
        let err = Aggregator::default()
            .aggregate(&[25_000.0], &[], &[])
            .unwrap_err();
        assert!(matches!(err, ExtractError::NoValidAmounts));
    }

    #[test]
    fn custom_policy_changes_the_bands() {
        let policy = CandidatePolicy {
            bands: vec![Band::new(20_000.0, 30_000.0)],
            ..CandidatePolicy::default()
        };
        let survivors = Aggregator::new(policy)
            .aggregate(&[25_000.0, 745.0], &[], &[])
            .unwrap();
        assert_eq!(survivors, vec![25_000.0]);
    }

    #[test]
    fn model_echoes_of_cleaned_tokens_dedup() {
        let survivors = Aggregator::default()
            .aggregate(&[745.0], &[745.0, 745.01], &[745.0])
            .unwrap();
        assert_eq!(survivors.len(), 1);
    }

    #[test]
    fn important_amounts_require_a_decimal_point() {
        let tokens = vec![
            "745.00".to_string(), // in range, decimal → kept
            "745".to_string(),    // no decimal point
            "5.50".to_string(),   // below 10
            "1500.00".to_string(), // above 1000
        ];
        assert_eq!(important_raw_amounts(&tokens), vec![745.0]);
    }

    #[test]
    fn important_amounts_ignore_percent_tokens() {
        assert_eq!(important_raw_amounts(&["9%".to_string()]), Vec::<f64>::new());
    }
}
