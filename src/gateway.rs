use std::future::Future;

use serde::Deserialize;
use serde_json::Value;

use crate::config::Config;
use crate::error::{ClientError, Result};
use crate::form::FormState;
use crate::models::{AuthResponse, PatientPredictionRecord, PredictPayload};

pub const GENERIC_PREDICTION_FAILURE: &str = "Prediction failed";

/// Network operations against the prediction service.
///
/// Every call carries the session credential established by `authenticate`.
/// Nothing is retried here.
pub trait PredictionGateway {
    fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> impl Future<Output = Result<AuthResponse>>;

    /// Returns the raw payload; the caller decides what it means.
    fn submit_prediction(&self, form: &FormState) -> impl Future<Output = Result<PredictPayload>>;

    /// Stored predictions in the order the service returns them.
    fn list_predictions(&self) -> impl Future<Output = Result<Vec<PatientPredictionRecord>>>;

    fn check_auth(&self) -> impl Future<Output = Result<bool>>;

    fn logout(&self) -> impl Future<Output = Result<()>>;
}

pub struct HttpGateway {
    client: reqwest::Client,
    base_url: String,
}

impl HttpGateway {
    pub fn new(config: &Config) -> Result<Self> {
        let mut builder = reqwest::Client::builder().cookie_store(true);
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(ClientError::network)?;

        Ok(Self {
            client,
            base_url: config.api_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/api/{}", self.base_url, path)
    }

    /// Reads the body whatever the status; the service reports failures in JSON.
    async fn read_json(&self, request: reqwest::RequestBuilder) -> Result<(u16, Option<Value>)> {
        let response = request.send().await.map_err(ClientError::network)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(ClientError::network)?;
        log::debug!("HTTP {status}, {} byte body", body.len());
        Ok((status, serde_json::from_str(&body).ok()))
    }
}

#[derive(Deserialize)]
struct AuthStatus {
    #[serde(default)]
    authenticated: bool,
}

fn server_error(value: &Value) -> Option<String> {
    value.get("error").and_then(Value::as_str).map(str::to_string)
}

impl PredictionGateway for HttpGateway {
    async fn authenticate(&self, username: &str, password: &str) -> Result<AuthResponse> {
        log::info!("Authenticating as {username}");
        let request = self
            .client
            .post(self.endpoint("login"))
            .json(&serde_json::json!({ "username": username, "password": password }));
        let (status, body) = self.read_json(request).await?;

        body.and_then(|value| serde_json::from_value(value).ok())
            .ok_or_else(|| {
                ClientError::Application(format!("unexpected login response (HTTP {status})"))
            })
    }

    async fn submit_prediction(&self, form: &FormState) -> Result<PredictPayload> {
        let request = self
            .client
            .post(self.endpoint("predict"))
            .json(&form.payload());
        let (status, body) = self.read_json(request).await?;

        match body {
            Some(value @ Value::Object(_)) => serde_json::from_value(value).map_err(|err| {
                log::warn!("Predict response did not match any known shape: {err}");
                ClientError::Application(GENERIC_PREDICTION_FAILURE.to_string())
            }),
            _ => {
                log::warn!("Predict response was not a JSON object (HTTP {status})");
                Err(ClientError::Application(GENERIC_PREDICTION_FAILURE.to_string()))
            }
        }
    }

    async fn list_predictions(&self) -> Result<Vec<PatientPredictionRecord>> {
        let request = self.client.get(self.endpoint("get-predictions"));
        let (status, body) = self.read_json(request).await?;

        match body {
            Some(value @ Value::Array(_)) => serde_json::from_value(value).map_err(|err| {
                ClientError::Application(format!("malformed prediction listing: {err}"))
            }),
            Some(value) => Err(ClientError::Application(server_error(&value).unwrap_or_else(
                || format!("unexpected listing response (HTTP {status})"),
            ))),
            None => Err(ClientError::Application(format!(
                "unexpected listing response (HTTP {status})"
            ))),
        }
    }

    async fn check_auth(&self) -> Result<bool> {
        let request = self.client.get(self.endpoint("check-auth"));
        let (status, body) = self.read_json(request).await?;

        body.and_then(|value| serde_json::from_value::<AuthStatus>(value).ok())
            .map(|auth| auth.authenticated)
            .ok_or_else(|| {
                ClientError::Application(format!("unexpected auth status response (HTTP {status})"))
            })
    }

    async fn logout(&self) -> Result<()> {
        let request = self.client.post(self.endpoint("logout"));
        let (status, body) = self.read_json(request).await?;

        if (200..300).contains(&status) {
            Ok(())
        } else {
            Err(ClientError::Application(
                body.as_ref()
                    .and_then(server_error)
                    .unwrap_or_else(|| format!("logout failed (HTTP {status})")),
            ))
        }
    }
}
