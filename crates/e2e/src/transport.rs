//! HTTP transport adapter
//!
//! Every request resolves to an [`ApiResponse`]; non-2xx statuses and
//! connection failures are values, never errors.

use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::E2eResult;

/// Status reported when no HTTP response was received at all
pub const TRANSPORT_FAILURE_STATUS: u16 = 0;

/// A single request against the gateway
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    /// Path relative to the base URL
    pub path: String,
    /// Query parameters, encoded by the client
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
    pub bearer: Option<String>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            bearer: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn bearer(mut self, token: impl Into<String>) -> Self {
        self.bearer = Some(token.into());
        self
    }
}

/// Response body, parsed as JSON when possible
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Json(Value),
    Text(String),
    Empty,
}

impl Body {
    /// Parse raw response text; anything that is not JSON is kept verbatim
    pub fn parse(text: &str) -> Self {
        if text.trim().is_empty() {
            return Body::Empty;
        }
        match serde_json::from_str(text) {
            Ok(value) => Body::Json(value),
            Err(_) => Body::Text(text.to_string()),
        }
    }

    pub fn json(&self) -> Option<&Value> {
        match self {
            Body::Json(value) => Some(value),
            _ => None,
        }
    }

    /// Look up a string field by JSON pointer, e.g. `/user/id`
    pub fn str_at(&self, pointer: &str) -> Option<&str> {
        self.json()?.pointer(pointer)?.as_str()
    }

    pub fn array(&self) -> Option<&Vec<Value>> {
        self.json()?.as_array()
    }
}

impl std::fmt::Display for Body {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Body::Json(value) => write!(f, "{}", value),
            Body::Text(text) => write!(f, "{}", text),
            Body::Empty => write!(f, "<empty>"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Body,
}

impl ApiResponse {
    pub fn transport_failure(reason: impl Into<String>) -> Self {
        Self {
            status: TRANSPORT_FAILURE_STATUS,
            body: Body::Text(reason.into()),
        }
    }

    pub fn is_transport_failure(&self) -> bool {
        self.status == TRANSPORT_FAILURE_STATUS
    }

    pub fn status_in(&self, accepted: &[u16]) -> bool {
        accepted.contains(&self.status)
    }

    /// Identifier of a created resource (`id`), rendered as a string
    pub fn resource_id(&self) -> Option<String> {
        id_string(self.body.json()?.get("id")?)
    }
}

/// Identifiers come back as UUID strings or numbers depending on the service
pub fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: ApiRequest) -> ApiResponse;

    fn base_url(&self) -> &str;
}

/// Gateway transport backed by reqwest
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(base_url: &str, timeout: Duration) -> E2eResult<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: ApiRequest) -> ApiResponse {
        let url = self.url(&request.path);
        debug!("{} {}", request.method, url);

        let mut builder = self.client.request(request.method.clone(), &url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(token) = &request.bearer {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) => {
                warn!("{} {} failed: {}", request.method, url, e);
                return ApiResponse::transport_failure(e.to_string());
            }
        };

        let status = response.status().as_u16();
        let body = match response.text().await {
            Ok(text) => Body::parse(&text),
            Err(e) => Body::Text(format!("failed to read body: {}", e)),
        };
        debug!("{} {} -> {} {}", request.method, url, status, body);

        ApiResponse { status, body }
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }
}
