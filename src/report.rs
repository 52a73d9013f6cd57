use std::fmt::Write;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::risk::PatientCohort;
use crate::views;

const BAR_WIDTH: f64 = 50.0;

fn yes_no(value: bool) -> &'static str {
    if value {
        "Yes"
    } else {
        "No"
    }
}

fn bar(probability: f64) -> String {
    let filled = (probability.clamp(0.0, 100.0) / 100.0 * BAR_WIDTH).round() as usize;
    "#".repeat(filled)
}

/// Record table, highest probability first.
pub fn render_record_table(cohort: &PatientCohort, limit: usize) -> String {
    let rows = views::table_rows(cohort);
    let mut output = String::new();

    if rows.is_empty() {
        let _ = writeln!(output, "No predictions recorded yet.");
        return output;
    }

    let _ = writeln!(
        output,
        "{:>4}  {:<24} {:<10} {:<10} {:>8}  {}",
        "ID", "Patient", "Patient ID", "Readmit", "Prob %", "Risk"
    );
    for row in rows.iter().take(limit) {
        let _ = writeln!(
            output,
            "{:>4}  {:<24} {:<10} {:<10} {:>8}  {}",
            row.id,
            row.patient_name,
            row.patient_id,
            yes_no(row.readmitted),
            row.probability,
            row.tier
        );
    }
    if rows.len() > limit {
        let _ = writeln!(output, "... {} more", rows.len() - limit);
    }

    output
}

/// Full clinical table, same ordering as the record table.
pub fn render_patient_table(cohort: &PatientCohort) -> String {
    let mut output = String::new();

    if cohort.is_empty() {
        let _ = writeln!(output, "No patients in the database.");
        return output;
    }

    let _ = writeln!(
        output,
        "Patient Name | Patient ID | Age | Specialty | Emergency | Outpatient | Inpatient | \
         Medications | Procedures | Lab Procedures | Days | A1C | Glucose | Change | \
         Diabetes Med | Diag 1 | Diag 2 | Diag 3 | Readmission | Probability (%)"
    );
    for classified in cohort.display_order() {
        let p = &classified.record;
        let _ = writeln!(
            output,
            "{} | {} | {} | {} | {} | {} | {} | {} | {} | {} | {} | {} | {} | {} | {} | {} | {} | {} | {} | {}",
            p.patient_name,
            p.patient_id,
            p.age,
            p.medical_specialty,
            p.n_emergency,
            p.n_outpatient,
            p.n_inpatient,
            p.n_medications,
            p.n_procedures,
            p.n_lab_procedures,
            p.time_in_hospital,
            p.a1c_test,
            p.glucose_test,
            p.change,
            p.diabetes_med,
            p.diag_1,
            p.diag_2,
            p.diag_3,
            yes_no(p.prediction),
            p.probability
        );
    }

    output
}

#[derive(Serialize)]
struct PatientRow<'a> {
    id: usize,
    patient_name: &'a str,
    patient_id: &'a str,
    age: &'a str,
    medical_specialty: &'a str,
    n_emergency: f64,
    n_outpatient: f64,
    n_inpatient: f64,
    n_medications: f64,
    n_procedures: f64,
    n_lab_procedures: f64,
    time_in_hospital: f64,
    #[serde(rename = "A1Ctest")]
    a1c_test: &'a str,
    glucose_test: &'a str,
    change: &'a str,
    diabetes_med: &'a str,
    diag_1: &'a str,
    diag_2: &'a str,
    diag_3: &'a str,
    prediction: bool,
    probability: f64,
    risk: &'static str,
}

pub fn write_patient_csv<W: std::io::Write>(cohort: &PatientCohort, out: W) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    for classified in cohort.display_order() {
        let p = &classified.record;
        writer.serialize(PatientRow {
            id: classified.id,
            patient_name: &p.patient_name,
            patient_id: &p.patient_id,
            age: &p.age,
            medical_specialty: &p.medical_specialty,
            n_emergency: p.n_emergency,
            n_outpatient: p.n_outpatient,
            n_inpatient: p.n_inpatient,
            n_medications: p.n_medications,
            n_procedures: p.n_procedures,
            n_lab_procedures: p.n_lab_procedures,
            time_in_hospital: p.time_in_hospital,
            a1c_test: &p.a1c_test,
            glucose_test: &p.glucose_test,
            change: &p.change,
            diabetes_med: &p.diabetes_med,
            diag_1: &p.diag_1,
            diag_2: &p.diag_2,
            diag_3: &p.diag_3,
            prediction: p.prediction,
            probability: p.probability,
            risk: classified.tier.as_str(),
        })?;
    }
    writer.flush()?;
    Ok(())
}

pub fn export_patient_csv(cohort: &PatientCohort, path: &Path) -> anyhow::Result<()> {
    let file = std::fs::File::create(path)?;
    write_patient_csv(cohort, file)
}

pub fn build_report(cohort: &PatientCohort, generated_at: DateTime<Utc>) -> String {
    let summary = cohort.summary();
    let mut output = String::new();

    let _ = writeln!(output, "# Patient Readmission Report");
    let _ = writeln!(
        output,
        "Generated {} across {} patients",
        generated_at.format("%Y-%m-%d %H:%M UTC"),
        summary.total()
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Risk Distribution");

    if cohort.is_empty() {
        let _ = writeln!(output, "No predictions recorded yet.");
        return output;
    }

    for slice in views::pie_series(&summary) {
        let share = slice.value as f64 / summary.total() as f64 * 100.0;
        let _ = writeln!(
            output,
            "- {}: {} ({:.1}%, {})",
            slice.name, slice.value, share, slice.color
        );
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Patient Readmission Probabilities");
    let _ = writeln!(output, "| Patient Name | Readmitted | Probability (%) | Risk |");
    let _ = writeln!(output, "|---|---|---|---|");
    for classified in cohort.records() {
        let _ = writeln!(
            output,
            "| {} | {} | {} | {} |",
            classified.record.patient_name,
            yes_no(classified.record.prediction),
            classified.record.probability,
            classified.tier
        );
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Probability Distribution");
    let _ = writeln!(output, "```");
    for point in views::bar_series(cohort) {
        let _ = writeln!(
            output,
            "{:<24} {:>6} {}",
            point.patient_name,
            point.probability,
            bar(point.probability)
        );
    }
    let _ = writeln!(output, "```");

    output
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::risk::{aggregate, sample_record};

    fn cohort() -> PatientCohort {
        aggregate(vec![
            sample_record("John Smith", 87.0),
            sample_record("Sarah Johnson", 23.0),
            sample_record("Michael Brown", 65.0),
            sample_record("Emily Davis", 18.0),
        ])
    }

    #[test]
    fn report_lists_tiers_in_fixed_order() {
        let generated_at = Utc.with_ymd_and_hms(2024, 1, 15, 9, 30, 0).unwrap();
        let report = build_report(&cohort(), generated_at);

        assert!(report.contains("Generated 2024-01-15 09:30 UTC across 4 patients"));
        let low = report.find("- Low Risk: 2 (50.0%").unwrap();
        let medium = report.find("- Medium Risk: 1 (25.0%").unwrap();
        let high = report.find("- High Risk: 1 (25.0%").unwrap();
        assert!(low < medium && medium < high);
        assert!(report.contains("| John Smith | Yes | 87 | High |"));
    }

    #[test]
    fn empty_report_says_so() {
        let report = build_report(&PatientCohort::default(), Utc::now());
        assert!(report.contains("No predictions recorded yet."));
        assert!(!report.contains("## Probability Distribution"));
    }

    #[test]
    fn record_table_respects_limit() {
        let table = render_record_table(&cohort(), 2);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[1].contains("John Smith"));
        assert!(lines[2].contains("Michael Brown"));
        assert_eq!(lines[3], "... 2 more");
    }

    #[test]
    fn bars_are_clamped() {
        assert_eq!(bar(100.0).len(), 50);
        assert_eq!(bar(150.0).len(), 50);
        assert_eq!(bar(-3.0).len(), 0);
        assert_eq!(bar(50.0).len(), 25);
    }

    #[test]
    fn csv_export_is_probability_ordered() {
        let mut buffer = Vec::new();
        write_patient_csv(&cohort(), &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert!(lines[0].starts_with("id,patient_name,patient_id,age,"));
        assert!(lines[0].contains(",A1Ctest,"));
        assert!(lines[1].starts_with("0,John Smith,"));
        assert!(lines[2].starts_with("2,Michael Brown,"));
        assert!(lines[4].ends_with(",Low"));
    }
}
