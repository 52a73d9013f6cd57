use crate::models::{AggregateSummary, ClassifiedRecord, RiskTier};
use crate::risk::PatientCohort;

#[derive(Debug, Clone, PartialEq)]
pub struct TableRow {
    pub id: usize,
    pub patient_name: String,
    pub patient_id: String,
    pub readmitted: bool,
    pub probability: f64,
    pub tier: RiskTier,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PieSlice {
    pub name: &'static str,
    pub value: usize,
    pub color: &'static str,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BarPoint {
    pub patient_name: String,
    pub probability: f64,
}

pub fn tier_color(tier: RiskTier) -> &'static str {
    match tier {
        RiskTier::Low => "#34D399",
        RiskTier::Medium => "#FBBF24",
        RiskTier::High => "#EF4444",
    }
}

fn tier_label(tier: RiskTier) -> &'static str {
    match tier {
        RiskTier::Low => "Low Risk",
        RiskTier::Medium => "Medium Risk",
        RiskTier::High => "High Risk",
    }
}

impl From<&ClassifiedRecord> for TableRow {
    fn from(classified: &ClassifiedRecord) -> Self {
        TableRow {
            id: classified.id,
            patient_name: classified.record.patient_name.clone(),
            patient_id: classified.record.patient_id.clone(),
            readmitted: classified.record.prediction,
            probability: classified.record.probability,
            tier: classified.tier,
        }
    }
}

/// Rows for the record table, highest probability first.
pub fn table_rows(cohort: &PatientCohort) -> Vec<TableRow> {
    cohort
        .display_order()
        .into_iter()
        .map(TableRow::from)
        .collect()
}

/// One slice per tier, always Low, Medium, High, so colors never shift.
pub fn pie_series(summary: &AggregateSummary) -> Vec<PieSlice> {
    summary
        .iter()
        .map(|(tier, value)| PieSlice {
            name: tier_label(tier),
            value,
            color: tier_color(tier),
        })
        .collect()
}

/// Per-record probabilities in fetch order.
pub fn bar_series(cohort: &PatientCohort) -> Vec<BarPoint> {
    cohort
        .records()
        .iter()
        .map(|classified| BarPoint {
            patient_name: classified.record.patient_name.clone(),
            probability: classified.record.probability,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::risk::{aggregate, sample_record};

    fn dashboard_cohort() -> PatientCohort {
        aggregate(vec![
            sample_record("John Smith", 87.0),
            sample_record("Sarah Johnson", 23.0),
            sample_record("Michael Brown", 65.0),
            sample_record("Emily Davis", 18.0),
        ])
    }

    #[test]
    fn table_rows_are_sorted_but_keep_fetch_ids() {
        let rows = table_rows(&dashboard_cohort());
        let names: Vec<&str> = rows.iter().map(|r| r.patient_name.as_str()).collect();
        assert_eq!(
            names,
            vec!["John Smith", "Michael Brown", "Sarah Johnson", "Emily Davis"]
        );
        let ids: Vec<usize> = rows.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![0, 2, 1, 3]);
        assert_eq!(rows[1].tier, RiskTier::Medium);
    }

    #[test]
    fn pie_series_has_fixed_order_even_when_tiers_are_missing() {
        let only_high = aggregate(vec![sample_record("A", 95.0), sample_record("B", 88.0)]);
        let slices = pie_series(&only_high.summary());

        let names: Vec<&str> = slices.iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["Low Risk", "Medium Risk", "High Risk"]);
        let values: Vec<usize> = slices.iter().map(|s| s.value).collect();
        assert_eq!(values, vec![0, 0, 2]);
        assert_eq!(slices[2].color, "#EF4444");
    }

    #[test]
    fn bar_series_follows_fetch_order() {
        let bars = bar_series(&dashboard_cohort());
        let probabilities: Vec<f64> = bars.iter().map(|b| b.probability).collect();
        assert_eq!(probabilities, vec![87.0, 23.0, 65.0, 18.0]);
    }

    #[test]
    fn empty_cohort_projects_to_empty_views() {
        let empty = PatientCohort::default();
        assert!(table_rows(&empty).is_empty());
        assert!(bar_series(&empty).is_empty());
        assert!(pie_series(&empty.summary()).iter().all(|s| s.value == 0));
    }
}
