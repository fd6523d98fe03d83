//! Native transport for the control panel core.
//!
//! Requests are sent exactly once: there is no retry loop and no client-side
//! timeout, mirroring what the browser panel does.

use std::rc::Rc;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use smarthome_panel_core::{
    ApiError, ApiRequest, ApiTransport, ConfigError, ControlPanel, HttpMethod, PageView,
    PanelConfig, RawResponse, TraceEntry, TraceSink,
};

pub const ENV_API_BASE_URL: &str = "SMARTHOME_API_BASE_URL";
pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:8080";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiClientConfig {
    /// Backend origin, e.g. `http://127.0.0.1:8080`. The panel's api base
    /// path is appended per request.
    pub base_url: String,
}

impl ApiClientConfig {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    /// Reads [`ENV_API_BASE_URL`], falling back to [`DEFAULT_API_BASE_URL`].
    pub fn from_env() -> Result<Self, ConfigError> {
        let base_url = env_non_empty(ENV_API_BASE_URL)
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());
        normalize_base_url(&base_url).map(Self::new)
    }
}

pub fn normalize_base_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(ConfigError::EmptyBaseUrl);
    }
    let Some((scheme, remainder)) = trimmed.split_once("://") else {
        return Err(ConfigError::InvalidBaseUrl);
    };
    if !matches!(scheme, "http" | "https") {
        return Err(ConfigError::InvalidBaseUrl);
    }
    if remainder.trim().is_empty() || remainder.starts_with('/') {
        return Err(ConfigError::InvalidBaseUrl);
    }
    Ok(trimmed.to_string())
}

fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn reqwest_method(method: HttpMethod) -> reqwest::Method {
    match method {
        HttpMethod::Get => reqwest::Method::GET,
        HttpMethod::Post => reqwest::Method::POST,
        HttpMethod::Put => reqwest::Method::PUT,
        HttpMethod::Patch => reqwest::Method::PATCH,
        HttpMethod::Delete => reqwest::Method::DELETE,
    }
}

/// [`ApiTransport`] over a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    base_url: String,
    http: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(config: ApiClientConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: normalize_base_url(&config.base_url)?,
            http: reqwest::Client::new(),
        })
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::new(ApiClientConfig::from_env()?)
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub fn endpoint(&self, request: &ApiRequest) -> String {
        format!("{}{}", self.base_url, request.url)
    }
}

#[async_trait(?Send)]
impl ApiTransport for ReqwestTransport {
    async fn send(&self, request: &ApiRequest) -> Result<RawResponse, ApiError> {
        let response = self
            .http
            .request(reqwest_method(request.method), self.endpoint(request))
            .send()
            .await
            .map_err(|error| ApiError::transport(error.to_string()))?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = response
            .text()
            .await
            .map_err(|error| ApiError::transport(error.to_string()))?;

        Ok(RawResponse {
            status,
            content_type,
            body,
        })
    }
}

/// Panel talking to a live backend over HTTP.
pub fn native_panel<P>(
    client: ApiClientConfig,
    page: Rc<P>,
    config: PanelConfig,
) -> Result<ControlPanel<ReqwestTransport, P>, ConfigError>
where
    P: PageView + 'static,
{
    config.validate()?;
    let transport = ReqwestTransport::new(client)?;
    Ok(ControlPanel::with_config(transport, page, config))
}

/// Forwards trace entries to `tracing` at info level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogTraceSink;

impl TraceSink for LogTraceSink {
    fn append(&self, entry: &TraceEntry) {
        match &entry.payload {
            Some(payload) => tracing::info!(time = %entry.time_label(), %payload, "{}", entry.message),
            None => tracing::info!(time = %entry.time_label(), "{}", entry.message),
        }
    }
}
