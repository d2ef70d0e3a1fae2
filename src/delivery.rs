use crate::config::DeliverySettings;
use crate::model::BuildRecord;
use crate::output;
use reqwest::blocking;
use std::time::Duration;
use thiserror::Error;

/// Fixed ingestion path appended to the configured base URL.
pub const PUSH_PATH: &str = "/integrations/jenkins/push";

/// Header carrying the shared secret.
pub const TOKEN_HEADER: &str = "x-ci-insight-token";

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("build http client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("send request: {0}")]
    Send(#[source] reqwest::Error),
}

/// Terminal state of one delivery attempt.
#[derive(Debug)]
pub enum Outcome {
    /// No token or URL configured; no network activity happened.
    Skipped,
    /// The endpoint answered with a status in [200, 300).
    Delivered,
    /// The endpoint answered with any other status. Not retried.
    Rejected(u16),
    /// The request never completed. Not retried.
    TransportFailed(TransportError),
}

impl Outcome {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Skipped => "skipped",
            Self::Delivered => "delivered",
            Self::Rejected(_) => "rejected",
            Self::TransportFailed(_) => "failed",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Client {
    pub api_url: String,
    pub api_token: String,
    pub timeout: Duration,
}

impl Client {
    pub fn new(settings: &DeliverySettings) -> Self {
        Self {
            api_url: settings.api_url.clone(),
            api_token: settings.api_token.clone(),
            timeout: settings.timeout,
        }
    }

    /// One synchronous delivery attempt. Every failure mode ends up in the
    /// returned `Outcome`; nothing propagates.
    pub fn push(&self, record: &BuildRecord) -> Outcome {
        if self.api_token.is_empty() || self.api_url.is_empty() {
            return Outcome::Skipped;
        }

        let timeout = if self.timeout.is_zero() {
            Duration::from_secs(10)
        } else {
            self.timeout
        };

        let client = match blocking::Client::builder().timeout(timeout).build() {
            Ok(client) => client,
            Err(err) => return Outcome::TransportFailed(TransportError::Client(err)),
        };

        let url = format!("{}{PUSH_PATH}", self.api_url.trim_end_matches('/'));
        let response = match client
            .post(&url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .header(TOKEN_HEADER, &self.api_token)
            .json(record)
            .send()
        {
            Ok(response) => response,
            Err(err) => return Outcome::TransportFailed(TransportError::Send(err)),
        };

        let status = response.status();
        if status.is_success() {
            Outcome::Delivered
        } else {
            Outcome::Rejected(status.as_u16())
        }
    }

    /// Best-effort entry point: attempts delivery, logs every non-delivered
    /// outcome, and never raises back into the completion path.
    pub fn send(&self, record: &BuildRecord) -> Outcome {
        let outcome = self.push(record);

        match &outcome {
            Outcome::Skipped => {
                eprintln!("{} api token not configured; delivery skipped", output::warn());
            }
            Outcome::Delivered => {}
            Outcome::Rejected(code) => {
                eprintln!(
                    "{} endpoint rejected build record: http {code}",
                    output::warn()
                );
            }
            Outcome::TransportFailed(err) => {
                eprintln!("{} failed to deliver build record: {err}", output::error());
            }
        }

        outcome
    }
}
