/// Failures surfaced by the gateway, the form controller and field validation.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The transport failed before any response was received.
    #[error("network error: {0}")]
    Network(String),

    /// The service answered but signaled failure or sent an unrecognized shape.
    #[error("{0}")]
    Application(String),

    /// A field value is outside its allowed set.
    #[error("invalid input: {0}")]
    Validation(String),

    #[error("a prediction request is already in flight")]
    Busy,
}

impl ClientError {
    pub fn network(err: reqwest::Error) -> Self {
        Self::Network(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
