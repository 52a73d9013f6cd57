use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::error::{ClientError, Result};
use crate::gateway::{PredictionGateway, GENERIC_PREDICTION_FAILURE};
use crate::models::{FieldKind, FormField, PredictPayload, PredictionOutcome};

pub const NETWORK_FAILURE: &str = "Network error";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionStatus {
    Idle,
    Submitting,
    Succeeded,
    Failed,
}

/// Field values of the prediction form plus where the last submit ended up.
#[derive(Debug, Clone, PartialEq)]
pub struct FormState {
    fields: BTreeMap<FormField, String>,
    status: SubmissionStatus,
    outcome: Option<PredictionOutcome>,
    failure: Option<String>,
}

impl Default for FormState {
    fn default() -> Self {
        Self {
            fields: FormField::ALL
                .into_iter()
                .map(|field| (field, String::new()))
                .collect(),
            status: SubmissionStatus::Idle,
            outcome: None,
            failure: None,
        }
    }
}

impl FormState {
    pub fn field(&self, field: FormField) -> &str {
        self.fields.get(&field).map(String::as_str).unwrap_or("")
    }

    pub fn status(&self) -> SubmissionStatus {
        self.status
    }

    pub fn outcome(&self) -> Option<&PredictionOutcome> {
        self.outcome.as_ref()
    }

    /// User-facing message of the last failed submit.
    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    pub fn is_blank(&self) -> bool {
        self.fields.values().all(String::is_empty)
    }

    /// Request body for the predict endpoint; every value is sent as a string.
    pub fn payload(&self) -> Value {
        let body: Map<String, Value> = self
            .fields
            .iter()
            .map(|(field, value)| (field.as_str().to_string(), Value::String(value.clone())))
            .collect();
        Value::Object(body)
    }
}

/// Turns either success shape of a predict payload into an outcome.
pub fn interpret(payload: PredictPayload) -> Result<PredictionOutcome> {
    if let Some(text) = payload.result.filter(|text| !text.is_empty()) {
        return Ok(PredictionOutcome::Message { text });
    }
    if let (Some(readmitted), Some(probability)) = (payload.readmitted, payload.probability) {
        return Ok(PredictionOutcome::Probabilistic {
            readmitted,
            probability,
        });
    }
    Err(ClientError::Application(
        payload
            .error
            .unwrap_or_else(|| GENERIC_PREDICTION_FAILURE.to_string()),
    ))
}

/// Input-layer check of a single value. The controller itself never calls this.
pub fn validate_field(field: FormField, value: &str) -> Result<()> {
    match field.kind() {
        FieldKind::Text => Ok(()),
        FieldKind::Count => match value.trim().parse::<f64>() {
            Ok(n) if n.is_finite() && n >= 0.0 => Ok(()),
            _ => Err(ClientError::Validation(format!(
                "{field} must be a non-negative number, got `{value}`"
            ))),
        },
        FieldKind::Choice(allowed) => {
            if allowed.iter().any(|candidate| *candidate == value) {
                Ok(())
            } else {
                Err(ClientError::Validation(format!(
                    "{field} must be one of {}, got `{value}`",
                    allowed.join(", ")
                )))
            }
        }
    }
}

/// Checks every non-text field of the form.
pub fn validate(state: &FormState) -> Result<()> {
    for field in FormField::ALL {
        if field.kind() == FieldKind::Text {
            continue;
        }
        let value = state.field(field);
        if value.is_empty() {
            return Err(ClientError::Validation(format!("{field} is required")));
        }
        validate_field(field, value)?;
    }
    Ok(())
}

/// Owns the form and drives `Idle -> Submitting -> Succeeded | Failed`.
#[derive(Debug, Default)]
pub struct FormController {
    state: FormState,
}

impl FormController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &FormState {
        &self.state
    }

    pub fn set(&mut self, field: FormField, value: impl Into<String>) -> Result<()> {
        if self.state.status == SubmissionStatus::Submitting {
            return Err(ClientError::Busy);
        }
        self.state.fields.insert(field, value.into());
        Ok(())
    }

    pub fn set_field(&mut self, name: &str, value: impl Into<String>) -> Result<()> {
        let field = name.parse::<FormField>().map_err(ClientError::Validation)?;
        self.set(field, value)
    }

    /// Enters `Submitting`. Fails with `Busy` if a request is already in flight.
    pub fn begin_submit(&mut self) -> Result<()> {
        if self.state.status == SubmissionStatus::Submitting {
            return Err(ClientError::Busy);
        }
        self.state.status = SubmissionStatus::Submitting;
        self.state.outcome = None;
        self.state.failure = None;
        Ok(())
    }

    /// Applies a gateway response. Ignored unless a submit is in flight.
    pub fn complete_submit(&mut self, response: Result<PredictPayload>) -> SubmissionStatus {
        if self.state.status != SubmissionStatus::Submitting {
            log::debug!("Dropping prediction response that arrived after the form left Submitting");
            return self.state.status;
        }

        match response.and_then(interpret) {
            Ok(outcome) => {
                self.state.outcome = Some(outcome);
                self.state.status = SubmissionStatus::Succeeded;
            }
            Err(ClientError::Network(detail)) => {
                log::warn!("Prediction request failed in transport: {detail}");
                self.state.failure = Some(NETWORK_FAILURE.to_string());
                self.state.status = SubmissionStatus::Failed;
            }
            Err(err) => {
                log::warn!("Prediction rejected: {err}");
                self.state.failure = Some(err.to_string());
                self.state.status = SubmissionStatus::Failed;
            }
        }
        self.state.status
    }

    /// Sends the form. Only `Busy` is returned as an error; every other
    /// failure ends in `SubmissionStatus::Failed`.
    pub async fn submit<G: PredictionGateway>(&mut self, gateway: &G) -> Result<SubmissionStatus> {
        self.begin_submit()?;
        let response = gateway.submit_prediction(&self.state).await;
        Ok(self.complete_submit(response))
    }

    pub fn reset(&mut self) {
        self.state = FormState::default();
    }
}
