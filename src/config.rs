use std::time::Duration;

use clap::Args;

use crate::error::{ClientError, Result};

pub const DEFAULT_API_URL: &str = "http://localhost:5000";

/// Connection settings shared by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct ConnectionArgs {
    /// Base URL of the prediction service
    #[arg(long, global = true, default_value = DEFAULT_API_URL)]
    pub api_url: String,
    #[arg(long, global = true, default_value = "doctor")]
    pub username: String,
    #[arg(long, global = true, default_value = "")]
    pub password: String,
    /// Abort requests that take longer than this many seconds
    #[arg(long, global = true)]
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    pub username: String,
    pub password: String,
    pub timeout: Option<Duration>,
}

impl Config {
    pub fn from_args(args: ConnectionArgs) -> Result<Self> {
        let api_url = args.api_url.trim().to_string();
        if !(api_url.starts_with("http://") || api_url.starts_with("https://")) {
            return Err(ClientError::Validation(format!(
                "api url must start with http:// or https://, got `{api_url}`"
            )));
        }
        if args.timeout_secs == Some(0) {
            return Err(ClientError::Validation(
                "timeout must be at least one second".to_string(),
            ));
        }

        Ok(Self {
            api_url,
            username: args.username,
            password: args.password,
            timeout: args.timeout_secs.map(Duration::from_secs),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(api_url: &str, timeout_secs: Option<u64>) -> ConnectionArgs {
        ConnectionArgs {
            api_url: api_url.to_string(),
            username: "doctor".to_string(),
            password: "secret".to_string(),
            timeout_secs,
        }
    }

    #[test]
    fn accepts_http_urls_and_converts_timeout() {
        let config = Config::from_args(args(" http://clinic.local:5000 ", Some(15))).unwrap();
        assert_eq!(config.api_url, "http://clinic.local:5000");
        assert_eq!(config.timeout, Some(Duration::from_secs(15)));
    }

    #[test]
    fn rejects_non_http_urls() {
        let err = Config::from_args(args("clinic.local", None)).unwrap_err();
        assert!(matches!(err, ClientError::Validation(_)));
    }

    #[test]
    fn rejects_zero_timeout() {
        assert!(Config::from_args(args(DEFAULT_API_URL, Some(0))).is_err());
    }
}
