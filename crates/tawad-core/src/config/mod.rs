//! Client configuration for one marketplace environment.
//!
//! These values are safe-to-ship public endpoints and the app API key
//! required to reach the REST API and the event feed. User credentials
//! never live here.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::util::{is_http_url, normalize_text_option};

const ENV_API_BASE_URL: &str = "TAWAD_API_BASE_URL";
const ENV_EVENTS_URL: &str = "TAWAD_EVENTS_URL";
const ENV_API_KEY: &str = "TAWAD_API_KEY";

/// Endpoints and app credentials for one marketplace environment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClientConfig {
    /// REST base URL, e.g. `https://api.example.com/api/v1`
    pub api_base_url: String,
    /// Event feed base URL. Falls back to `api_base_url` when not set.
    pub events_url: String,
    /// App API key sent as `X-API-Key` on every request
    #[serde(default)]
    pub api_key: Option<String>,
}

impl ClientConfig {
    /// Build a validated config. URLs are trimmed of trailing slashes;
    /// `events_url` defaults to `api_base_url` when omitted.
    pub fn new(
        api_base_url: impl Into<String>,
        events_url: Option<String>,
        api_key: Option<String>,
    ) -> Result<Self> {
        let api_base_url = normalize_http_url(api_base_url.into(), "api_base_url")?;
        let events_url = match normalize_text_option(events_url) {
            Some(url) => normalize_http_url(url, "events_url")?,
            None => api_base_url.clone(),
        };

        Ok(Self {
            api_base_url,
            events_url,
            api_key: normalize_text_option(api_key),
        })
    }

    /// Read the config from `TAWAD_API_BASE_URL`, `TAWAD_EVENTS_URL`, and
    /// `TAWAD_API_KEY`.
    pub fn from_env() -> Result<Self> {
        let api_base_url = std::env::var(ENV_API_BASE_URL).map_err(|_| {
            Error::Config(format!("{ENV_API_BASE_URL} is not set"))
        })?;
        Self::new(
            api_base_url,
            std::env::var(ENV_EVENTS_URL).ok(),
            std::env::var(ENV_API_KEY).ok(),
        )
    }
}

fn normalize_http_url(raw: String, field: &str) -> Result<String> {
    let value = normalize_text_option(Some(raw))
        .ok_or_else(|| Error::Config(format!("{field} must not be empty")))?;
    if is_http_url(&value) {
        Ok(value.trim_end_matches('/').to_string())
    } else {
        Err(Error::Config(format!(
            "{field} must include http:// or https://"
        )))
    }
}
