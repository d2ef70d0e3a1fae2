use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use std::time::Duration;

pub const CURRENT_VERSION: i32 = 1;
pub const DEFAULT_API_URL: &str = "http://localhost:3000";

/// Environment variables that override the file values at push time.
pub const URL_OVERRIDE_VAR: &str = "CI_INSIGHT_API_URL";
pub const TOKEN_OVERRIDE_VAR: &str = "CI_INSIGHT_API_TOKEN";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub version: i32,
    pub api: Api,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct Api {
    pub url: String,
    pub token: String,
    pub timeout: String,
}

/// Settings the delivery client runs with, resolved once per invocation
/// and read-only during a send.
#[derive(Debug, Clone)]
pub struct DeliverySettings {
    pub api_url: String,
    pub api_token: String,
    pub timeout: Duration,
}

impl DeliverySettings {
    /// Applies the process-environment overrides on top of the file values.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var(URL_OVERRIDE_VAR)
            && !url.is_empty()
        {
            self.api_url = url;
        }

        if let Ok(token) = std::env::var(TOKEN_OVERRIDE_VAR)
            && !token.is_empty()
        {
            self.api_token = token;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

#[derive(Debug, Clone, Default)]
pub struct ValidationErrors {
    pub issues: Vec<ValidationError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add<F: Into<String>, M: Into<String>>(&mut self, field: F, message: M) {
        self.issues.push(ValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn has_issues(&self) -> bool {
        !self.issues.is_empty()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(first) = self.issues.first() {
            write!(
                f,
                "configuration validation failed: {}: {}",
                first.field, first.message
            )
        } else {
            write!(f, "configuration validation failed")
        }
    }
}

impl std::error::Error for ValidationErrors {}

pub fn load(path: &Path) -> Result<Config, String> {
    let cfg = parse(path)?;
    validate(&cfg).map_err(|e| e.to_string())?;
    Ok(cfg)
}

pub fn parse(path: &Path) -> Result<Config, String> {
    let text = fs::read_to_string(path).map_err(|e| format!("read config: {e}"))?;
    let cfg: Config = serde_yaml::from_str(&text).map_err(|e| format!("parse config yaml: {e}"))?;
    Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<(), ValidationErrors> {
    let mut issues = ValidationErrors::new();

    if cfg.version != CURRENT_VERSION {
        issues.add("version", format!("must be {CURRENT_VERSION}"));
    }

    if !cfg.api.url.is_empty() && reqwest::Url::parse(&cfg.api.url).is_err() {
        issues.add("api.url", "must be a valid URL");
    }

    if !cfg.api.timeout.is_empty() && humantime::parse_duration(&cfg.api.timeout).is_err() {
        issues.add("api.timeout", "must be a valid duration");
    }

    if issues.has_issues() {
        Err(issues)
    } else {
        Ok(())
    }
}

impl Config {
    pub fn resolve_delivery_settings(&self) -> Result<DeliverySettings, String> {
        let api_url = if self.api.url.is_empty() {
            DEFAULT_API_URL.to_string()
        } else {
            self.api.url.clone()
        };

        let timeout =
            resolve_duration(&self.api.timeout, DEFAULT_TIMEOUT).map_err(|e| format!("api.timeout: {e}"))?;

        Ok(DeliverySettings {
            api_url,
            api_token: self.api.token.clone(),
            timeout,
        })
    }
}

fn resolve_duration(text: &str, default_value: Duration) -> Result<Duration, String> {
    if text.is_empty() {
        return Ok(default_value);
    }

    humantime::parse_duration(text).map_err(|_| "must be a valid duration".to_string())
}
