use std::fmt;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::ApiError;
use crate::params::ParamMap;
use crate::template::expand_template;

pub const API_BASE_PATH: &str = "/api";
pub const DEFAULT_FAILURE_MESSAGE: &str = "Request failed";
pub const JSON_CONTENT_TYPE: &str = "application/json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }

    /// Case-insensitive parse of a method name as written in markup.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "GET" => Some(Self::Get),
            "POST" => Some(Self::Post),
            "PUT" => Some(Self::Put),
            "PATCH" => Some(Self::Patch),
            "DELETE" => Some(Self::Delete),
            _ => None,
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Path and query produced from an endpoint template, relative to the base.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltUrl {
    pub path: String,
    /// Either empty or `?`-prefixed.
    pub query: String,
}

impl BuiltUrl {
    #[must_use]
    pub fn path_and_query(&self) -> String {
        format!("{}{}", self.path, self.query)
    }
}

/// Serializes `params` the way `URLSearchParams` does, skipping nulls.
#[must_use]
pub fn build_query(params: &ParamMap) -> String {
    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    let mut appended = false;
    for (name, value) in params {
        if let Some(value) = value.to_param_string() {
            serializer.append_pair(name, &value);
            appended = true;
        }
    }
    if !appended {
        return String::new();
    }
    format!("?{}", serializer.finish())
}

/// Fills the template from `params`; whatever the template did not consume
/// goes to the query string.
#[must_use]
pub fn build_url(template: &str, mut params: ParamMap) -> BuiltUrl {
    let path = expand_template(template, &mut params);
    let query = build_query(&params);
    BuiltUrl { path, query }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest {
    pub method: HttpMethod,
    /// Base path + templated path + query.
    pub url: String,
}

impl ApiRequest {
    /// The url without its query string.
    #[must_use]
    pub fn path(&self) -> &str {
        self.url.split('?').next().unwrap_or_default()
    }
}

/// What a transport hands back before any decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: String,
}

impl RawResponse {
    #[must_use]
    pub fn json(status: u16, body: &Value) -> Self {
        Self {
            status,
            content_type: Some(JSON_CONTENT_TYPE.to_string()),
            body: body.to_string(),
        }
    }

    #[must_use]
    pub fn text(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            content_type: Some("text/plain;charset=UTF-8".to_string()),
            body: body.into(),
        }
    }

    #[must_use]
    pub fn empty(status: u16) -> Self {
        Self {
            status,
            content_type: None,
            body: String::new(),
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..=299).contains(&self.status)
    }

    #[must_use]
    pub fn declares_json(&self) -> bool {
        self.content_type
            .as_deref()
            .is_some_and(|value| value.to_ascii_lowercase().contains(JSON_CONTENT_TYPE))
    }
}

/// Sends one request. Implemented over `gloo-net` in the browser and over
/// `reqwest` natively.
#[async_trait(?Send)]
pub trait ApiTransport {
    async fn send(&self, request: &ApiRequest) -> Result<RawResponse, ApiError>;
}

#[async_trait(?Send)]
impl<T: ApiTransport + ?Sized> ApiTransport for &T {
    async fn send(&self, request: &ApiRequest) -> Result<RawResponse, ApiError> {
        (**self).send(request).await
    }
}

#[async_trait(?Send)]
impl<T: ApiTransport + ?Sized> ApiTransport for std::rc::Rc<T> {
    async fn send(&self, request: &ApiRequest) -> Result<RawResponse, ApiError> {
        (**self).send(request).await
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    Json(Value),
    Text(String),
}

impl ResponseBody {
    #[must_use]
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Self::Json(value) => Some(value),
            Self::Text(_) => None,
        }
    }

    /// JSON view of the body; text becomes a JSON string.
    #[must_use]
    pub fn to_value(&self) -> Value {
        match self {
            Self::Json(value) => value.clone(),
            Self::Text(text) => Value::String(text.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: ResponseBody,
}

/// Message reported for a failed request: a non-empty string body (JSON or
/// text, whitespace included), else a truthy `message` field of a JSON
/// object in its string form, else [`DEFAULT_FAILURE_MESSAGE`].
#[must_use]
pub fn failure_message(body: &ResponseBody) -> String {
    let message = match body {
        ResponseBody::Json(Value::String(text)) | ResponseBody::Text(text) => {
            (!text.is_empty()).then(|| text.clone())
        }
        ResponseBody::Json(value) => value.get("message").and_then(truthy_message),
    };
    message.unwrap_or_else(|| DEFAULT_FAILURE_MESSAGE.to_string())
}

fn truthy_message(value: &Value) -> Option<String> {
    match value {
        Value::Null | Value::Bool(false) => None,
        Value::String(text) if text.is_empty() => None,
        Value::String(text) => Some(text.clone()),
        Value::Number(number) if number.as_f64().is_some_and(|n| n == 0.0) => None,
        other => Some(other.to_string()),
    }
}

pub fn decode_response(raw: RawResponse) -> Result<ApiResponse, ApiError> {
    let success = raw.is_success();
    let body = if raw.declares_json() {
        match serde_json::from_str::<Value>(&raw.body) {
            Ok(value) => ResponseBody::Json(value),
            // A failed request still reports its text rather than a decode error.
            Err(_) if !success => ResponseBody::Text(raw.body),
            Err(error) => {
                return Err(ApiError::Decode {
                    message: error.to_string(),
                });
            }
        }
    } else {
        ResponseBody::Text(raw.body)
    };

    if !success {
        return Err(ApiError::RequestFailed {
            status: raw.status,
            message: failure_message(&body),
        });
    }

    Ok(ApiResponse {
        status: raw.status,
        body,
    })
}

/// Turns `(method, template, params)` triples into HTTP calls.
///
/// Holds nothing mutable, so any number of `execute` futures may be in
/// flight at once.
#[derive(Debug, Clone)]
pub struct RequestExecutor<T> {
    transport: T,
    base_path: String,
}

impl<T: ApiTransport> RequestExecutor<T> {
    pub fn new(transport: T) -> Self {
        Self::with_base_path(transport, API_BASE_PATH)
    }

    pub fn with_base_path(transport: T, base_path: impl Into<String>) -> Self {
        let base_path = base_path.into();
        Self {
            transport,
            base_path: base_path.trim_end_matches('/').to_string(),
        }
    }

    #[must_use]
    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    #[must_use]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    #[must_use]
    pub fn request_for(&self, method: HttpMethod, template: &str, params: ParamMap) -> ApiRequest {
        let built = build_url(template, params);
        ApiRequest {
            method,
            url: format!("{}{}", self.base_path, built.path_and_query()),
        }
    }

    pub async fn execute(
        &self,
        method: HttpMethod,
        template: &str,
        params: ParamMap,
    ) -> Result<ApiResponse, ApiError> {
        let request = self.request_for(method, template, params);
        debug!(method = %request.method, url = %request.url, "sending api request");

        let raw = self.transport.send(&request).await.inspect_err(|error| {
            warn!(method = %request.method, url = %request.url, %error, "api transport failed");
        })?;
        debug!(status = raw.status, url = %request.url, "api response received");

        decode_response(raw)
    }
}
