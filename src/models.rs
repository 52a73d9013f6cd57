use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One stored prediction as returned by the listing endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientPredictionRecord {
    #[serde(default)]
    pub patient_name: String,
    #[serde(default)]
    pub patient_id: String,
    #[serde(default)]
    pub age: String,
    #[serde(default)]
    pub medical_specialty: String,
    #[serde(default)]
    pub n_emergency: f64,
    #[serde(default)]
    pub n_outpatient: f64,
    #[serde(default)]
    pub n_inpatient: f64,
    #[serde(default)]
    pub n_medications: f64,
    #[serde(default)]
    pub n_procedures: f64,
    #[serde(default)]
    pub n_lab_procedures: f64,
    #[serde(default)]
    pub time_in_hospital: f64,
    #[serde(rename = "A1Ctest", default)]
    pub a1c_test: String,
    #[serde(default)]
    pub glucose_test: String,
    #[serde(default)]
    pub change: String,
    #[serde(default)]
    pub diabetes_med: String,
    #[serde(default)]
    pub diag_1: String,
    #[serde(default)]
    pub diag_2: String,
    #[serde(default)]
    pub diag_3: String,
    pub prediction: bool,
    pub probability: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiskTier {
    Low,
    Medium,
    High,
}

impl RiskTier {
    /// Fixed enumeration order for every report that lists tiers.
    pub const ALL: [RiskTier; 3] = [RiskTier::Low, RiskTier::Medium, RiskTier::High];

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskTier::Low => "Low",
            RiskTier::Medium => "Medium",
            RiskTier::High => "High",
        }
    }
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A record with its derived tier and the index it arrived at.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedRecord {
    pub id: usize,
    pub tier: RiskTier,
    pub record: PatientPredictionRecord,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AggregateSummary {
    pub low: usize,
    pub medium: usize,
    pub high: usize,
}

impl AggregateSummary {
    pub fn get(&self, tier: RiskTier) -> usize {
        match tier {
            RiskTier::Low => self.low,
            RiskTier::Medium => self.medium,
            RiskTier::High => self.high,
        }
    }

    pub fn total(&self) -> usize {
        self.low + self.medium + self.high
    }

    /// Counts in `[Low, Medium, High]` order.
    pub fn iter(&self) -> impl Iterator<Item = (RiskTier, usize)> + '_ {
        RiskTier::ALL.into_iter().map(|tier| (tier, self.get(tier)))
    }
}

/// How a form field is entered and checked by the input layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Count,
    Choice(&'static [&'static str]),
}

pub const AGE_BRACKETS: &[&str] = &[
    "[40-50)", "[50-60)", "[60-70)", "[70-80)", "[80-90)", "[90-100)",
];
pub const TEST_RESULTS: &[&str] = &["no", "normal", "high"];
pub const YES_NO: &[&str] = &["no", "yes"];
pub const SPECIALTIES: &[&str] = &[
    "Missing",
    "Other",
    "InternalMedicine",
    "Family/GeneralPractice",
    "Cardiology",
    "Surgery",
    "Emergency/Trauma",
];
pub const DIAGNOSES: &[&str] = &[
    "Circulatory",
    "Other",
    "Injury",
    "Digestive",
    "Respiratory",
    "Diabetes",
    "Musculoskeletal",
    "Missing",
];

/// Clinical input fields of the prediction form, named as on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FormField {
    PatientName,
    PatientId,
    Age,
    TimeInHospital,
    A1cTest,
    GlucoseTest,
    DiabetesMed,
    MedicalSpecialty,
    NEmergency,
    NOutpatient,
    NInpatient,
    NMedications,
    NProcedures,
    NLabProcedures,
    Change,
    Diag1,
    Diag2,
    Diag3,
}

impl FormField {
    pub const ALL: [FormField; 18] = [
        FormField::PatientName,
        FormField::PatientId,
        FormField::Age,
        FormField::TimeInHospital,
        FormField::A1cTest,
        FormField::GlucoseTest,
        FormField::DiabetesMed,
        FormField::MedicalSpecialty,
        FormField::NEmergency,
        FormField::NOutpatient,
        FormField::NInpatient,
        FormField::NMedications,
        FormField::NProcedures,
        FormField::NLabProcedures,
        FormField::Change,
        FormField::Diag1,
        FormField::Diag2,
        FormField::Diag3,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FormField::PatientName => "patient_name",
            FormField::PatientId => "patient_id",
            FormField::Age => "age",
            FormField::TimeInHospital => "time_in_hospital",
            FormField::A1cTest => "A1Ctest",
            FormField::GlucoseTest => "glucose_test",
            FormField::DiabetesMed => "diabetes_med",
            FormField::MedicalSpecialty => "medical_specialty",
            FormField::NEmergency => "n_emergency",
            FormField::NOutpatient => "n_outpatient",
            FormField::NInpatient => "n_inpatient",
            FormField::NMedications => "n_medications",
            FormField::NProcedures => "n_procedures",
            FormField::NLabProcedures => "n_lab_procedures",
            FormField::Change => "change",
            FormField::Diag1 => "diag_1",
            FormField::Diag2 => "diag_2",
            FormField::Diag3 => "diag_3",
        }
    }

    pub fn kind(&self) -> FieldKind {
        match self {
            FormField::PatientName | FormField::PatientId => FieldKind::Text,
            FormField::TimeInHospital
            | FormField::NEmergency
            | FormField::NOutpatient
            | FormField::NInpatient
            | FormField::NMedications
            | FormField::NProcedures
            | FormField::NLabProcedures => FieldKind::Count,
            FormField::Age => FieldKind::Choice(AGE_BRACKETS),
            FormField::A1cTest | FormField::GlucoseTest => FieldKind::Choice(TEST_RESULTS),
            FormField::DiabetesMed | FormField::Change => FieldKind::Choice(YES_NO),
            FormField::MedicalSpecialty => FieldKind::Choice(SPECIALTIES),
            FormField::Diag1 | FormField::Diag2 | FormField::Diag3 => FieldKind::Choice(DIAGNOSES),
        }
    }
}

impl fmt::Display for FormField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FormField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FormField::ALL
            .into_iter()
            .find(|field| field.as_str() == s)
            .ok_or_else(|| format!("unknown form field `{s}`"))
    }
}

/// Normalized result of a prediction request.
#[derive(Debug, Clone, PartialEq)]
pub enum PredictionOutcome {
    /// The service sent a pre-formatted result string.
    Message { text: String },
    Probabilistic { readmitted: bool, probability: f64 },
}

impl fmt::Display for PredictionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PredictionOutcome::Message { text } => f.write_str(text),
            PredictionOutcome::Probabilistic {
                readmitted: true,
                probability,
            } => write!(f, "Readmitted ({probability}% chance)"),
            PredictionOutcome::Probabilistic {
                readmitted: false,
                probability,
            } => write!(f, "Not Readmitted ({probability}% chance)"),
        }
    }
}

/// Raw body of a predict response; any subset of members may be present.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PredictPayload {
    pub result: Option<String>,
    pub readmitted: Option<bool>,
    pub probability: Option<f64>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AuthResponse {
    #[serde(default)]
    pub success: bool,
    pub error: Option<String>,
}
