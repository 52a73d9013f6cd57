use crate::models::{AggregateSummary, ClassifiedRecord, PatientPredictionRecord, RiskTier};

/// Maps a readmission probability (0-100 scale) to a risk tier.
///
/// No range check is applied: values outside 0-100 classify by the same
/// thresholds, and NaN falls through to `Low`.
pub fn classify(probability: f64) -> RiskTier {
    if probability > 70.0 {
        RiskTier::High
    } else if probability > 40.0 {
        RiskTier::Medium
    } else {
        RiskTier::Low
    }
}

/// Classified records from a single listing, kept in the order they arrived.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PatientCohort {
    records: Vec<ClassifiedRecord>,
}

impl PatientCohort {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in as-received order; `records()[i].id == i`.
    pub fn records(&self) -> &[ClassifiedRecord] {
        &self.records
    }

    /// Records by probability, highest first. Ties keep their fetch order.
    pub fn display_order(&self) -> Vec<&ClassifiedRecord> {
        let mut ordered: Vec<&ClassifiedRecord> = self.records.iter().collect();
        ordered.sort_by(|a, b| b.record.probability.total_cmp(&a.record.probability));
        ordered
    }

    pub fn summary(&self) -> AggregateSummary {
        let mut summary = AggregateSummary::default();
        for classified in self.records.iter() {
            match classified.tier {
                RiskTier::Low => summary.low += 1,
                RiskTier::Medium => summary.medium += 1,
                RiskTier::High => summary.high += 1,
            }
        }
        summary
    }
}

/// Assigns identifiers by position and classifies every record.
pub fn aggregate(records: Vec<PatientPredictionRecord>) -> PatientCohort {
    let records = records
        .into_iter()
        .enumerate()
        .map(|(id, record)| ClassifiedRecord {
            id,
            tier: classify(record.probability),
            record,
        })
        .collect();

    PatientCohort { records }
}

#[cfg(test)]
pub(crate) fn sample_record(name: &str, probability: f64) -> PatientPredictionRecord {
    PatientPredictionRecord {
        patient_name: name.to_string(),
        patient_id: format!("P-{name}"),
        age: "[60-70)".to_string(),
        medical_specialty: "Cardiology".to_string(),
        n_emergency: 1.0,
        n_outpatient: 0.0,
        n_inpatient: 2.0,
        n_medications: 14.0,
        n_procedures: 1.0,
        n_lab_procedures: 40.0,
        time_in_hospital: 5.0,
        a1c_test: "normal".to_string(),
        glucose_test: "no".to_string(),
        change: "yes".to_string(),
        diabetes_med: "yes".to_string(),
        diag_1: "Circulatory".to_string(),
        diag_2: "Diabetes".to_string(),
        diag_3: "Other".to_string(),
        prediction: probability > 50.0,
        probability,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cohort_of(probabilities: &[f64]) -> PatientCohort {
        let records = probabilities
            .iter()
            .enumerate()
            .map(|(i, p)| sample_record(&format!("patient-{i}"), *p))
            .collect();
        aggregate(records)
    }

    #[test]
    fn thresholds_follow_expected_tiers() {
        assert_eq!(classify(40.0), RiskTier::Low);
        assert_eq!(classify(40.01), RiskTier::Medium);
        assert_eq!(classify(41.0), RiskTier::Medium);
        assert_eq!(classify(70.0), RiskTier::Medium);
        assert_eq!(classify(70.5), RiskTier::High);
        assert_eq!(classify(71.0), RiskTier::High);
    }

    #[test]
    fn out_of_range_values_use_same_rule() {
        assert_eq!(classify(-5.0), RiskTier::Low);
        assert_eq!(classify(250.0), RiskTier::High);
        assert_eq!(classify(f64::NAN), RiskTier::Low);
        assert_eq!(classify(f64::INFINITY), RiskTier::High);
    }

    #[test]
    fn tiers_are_monotonic_in_probability() {
        let mut previous = classify(-100.0);
        for step in -100..=200 {
            let tier = classify(step as f64 * 0.5);
            assert!(tier >= previous, "tier dropped at {}", step as f64 * 0.5);
            previous = tier;
        }
    }

    #[test]
    fn dashboard_sample_is_ranked_and_counted() {
        let cohort = cohort_of(&[87.0, 23.0, 65.0, 18.0]);

        let tiers: Vec<RiskTier> = cohort.records().iter().map(|r| r.tier).collect();
        assert_eq!(
            tiers,
            vec![RiskTier::High, RiskTier::Low, RiskTier::Medium, RiskTier::Low]
        );

        let ids: Vec<usize> = cohort.records().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![0, 1, 2, 3]);

        let display_ids: Vec<usize> = cohort.display_order().iter().map(|r| r.id).collect();
        assert_eq!(display_ids, vec![0, 2, 1, 3]);

        assert_eq!(
            cohort.summary(),
            AggregateSummary {
                low: 2,
                medium: 1,
                high: 1
            }
        );
    }

    #[test]
    fn ids_follow_fetch_order_and_display_is_non_increasing() {
        let cohort = cohort_of(&[12.0, 99.0, 45.5, 45.5, 70.0, 0.0, 88.25]);

        for (index, classified) in cohort.records().iter().enumerate() {
            assert_eq!(classified.id, index);
        }

        let ordered = cohort.display_order();
        for pair in ordered.windows(2) {
            assert!(pair[0].record.probability >= pair[1].record.probability);
        }
    }

    #[test]
    fn ties_keep_fetch_order() {
        let cohort = cohort_of(&[50.0, 80.0, 50.0, 50.0]);
        let display_ids: Vec<usize> = cohort.display_order().iter().map(|r| r.id).collect();
        assert_eq!(display_ids, vec![1, 0, 2, 3]);
    }

    #[test]
    fn summary_counts_sum_to_record_count() {
        let cohort = cohort_of(&[10.0, 41.0, 71.0, 90.0, 40.0]);
        assert_eq!(cohort.summary().total(), cohort.len());

        let counts: Vec<(RiskTier, usize)> = cohort.summary().iter().collect();
        assert_eq!(
            counts,
            vec![(RiskTier::Low, 2), (RiskTier::Medium, 1), (RiskTier::High, 2)]
        );
    }

    #[test]
    fn empty_listing_is_not_an_error() {
        let cohort = aggregate(Vec::new());
        assert!(cohort.is_empty());
        assert!(cohort.display_order().is_empty());
        assert_eq!(cohort.summary(), AggregateSummary::default());
        assert_eq!(cohort.summary().total(), 0);
    }
}
