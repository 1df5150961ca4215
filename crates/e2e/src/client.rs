//! JSON-over-HTTP client for the service under test

use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, warn};

use crate::config::HarnessConfig;
use crate::error::{HarnessError, HarnessResult};

/// Characters of a non-JSON body shown when a status code is unexpected
const TEXT_PREVIEW_CHARS: usize = 500;

/// A request as it was issued, kept for diagnostics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestRecord {
    pub method: String,
    pub url: String,
    pub body: Option<Value>,
}

/// A fully read response
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub text: String,
    json: Option<Value>,
}

impl ApiResponse {
    pub fn new(status: u16, content_type: Option<String>, text: impl Into<String>) -> Self {
        let text = text.into();
        let json = serde_json::from_str(&text).ok();
        Self {
            status,
            content_type,
            text,
            json,
        }
    }

    /// Response carrying a JSON body
    pub fn from_json(status: u16, body: Value) -> Self {
        Self {
            status,
            content_type: Some("application/json".to_string()),
            text: body.to_string(),
            json: Some(body),
        }
    }

    /// Parsed body, if it was valid JSON
    pub fn json(&self) -> Option<&Value> {
        self.json.as_ref()
    }

    pub fn is_json_content(&self) -> bool {
        self.content_type
            .as_deref()
            .map(|ct| ct.starts_with("application/json"))
            .unwrap_or(false)
    }
}

/// Client bound to a single base URL
pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
    history: Vec<RequestRecord>,
}

impl ApiClient {
    pub fn new(config: &HarnessConfig) -> HarnessResult<Self> {
        let base_url = config.base_url.trim().trim_end_matches('/');
        let mut builder = reqwest::Client::builder().timeout(config.timeout());
        // A loopback service is never reached through a proxy
        if is_loopback(base_url) {
            builder = builder.no_proxy();
        }
        let http = builder.build()?;
        Ok(Self {
            base_url: base_url.to_string(),
            http,
            history: Vec::new(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for an endpoint, tolerant of a leading slash
    pub fn url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'))
    }

    pub async fn get(&mut self, endpoint: &str, expected: Option<u16>) -> HarnessResult<ApiResponse> {
        self.request(Method::GET, endpoint, None, expected).await
    }

    pub async fn post(
        &mut self,
        endpoint: &str,
        body: Option<&Value>,
        expected: Option<u16>,
    ) -> HarnessResult<ApiResponse> {
        self.request(Method::POST, endpoint, body, expected).await
    }

    pub async fn put(
        &mut self,
        endpoint: &str,
        body: Option<&Value>,
        expected: Option<u16>,
    ) -> HarnessResult<ApiResponse> {
        self.request(Method::PUT, endpoint, body, expected).await
    }

    pub async fn delete(&mut self, endpoint: &str, expected: Option<u16>) -> HarnessResult<ApiResponse> {
        self.request(Method::DELETE, endpoint, None, expected).await
    }

    /// Every request issued so far, oldest first
    pub fn history(&self) -> &[RequestRecord] {
        &self.history
    }

    pub fn last_request(&self) -> Option<&RequestRecord> {
        self.history.last()
    }

    async fn request(
        &mut self,
        method: Method,
        endpoint: &str,
        body: Option<&Value>,
        expected: Option<u16>,
    ) -> HarnessResult<ApiResponse> {
        let url = self.url(endpoint);

        self.history.push(RequestRecord {
            method: method.to_string(),
            url: url.clone(),
            body: body.cloned(),
        });

        debug!("{} {}", method, url);

        let mut builder = self.http.request(method.clone(), &url);
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let fail = |e: reqwest::Error| {
            error!("Request failed for URL {}: {}", url, e);
            HarnessError::Request {
                method: method.to_string(),
                url: url.clone(),
                reason: e.to_string(),
            }
        };

        let resp = builder.send().await.map_err(&fail)?;
        let status = resp.status().as_u16();
        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let text = resp.text().await.map_err(&fail)?;

        let response = ApiResponse::new(status, content_type, text);

        if let Some(expected) = expected {
            if status != expected {
                log_unexpected(&response, expected);
            }
        }

        Ok(response)
    }
}

fn is_loopback(base_url: &str) -> bool {
    let host = match reqwest::Url::parse(base_url) {
        Ok(url) => url.host_str().map(str::to_string),
        Err(_) => None,
    };
    match host {
        Some(host) if host.eq_ignore_ascii_case("localhost") => true,
        Some(host) => host
            .trim_matches(&['[', ']'][..])
            .parse::<std::net::IpAddr>()
            .map(|ip| ip.is_loopback())
            .unwrap_or(false),
        None => false,
    }
}

fn log_unexpected(response: &ApiResponse, expected: u16) {
    for line in unexpected_status_report(response, expected) {
        warn!("{}", line);
    }
}

/// Lines logged for a status mismatch: the mismatch itself, then the
/// pretty-printed JSON body or a character-bounded preview of the text
fn unexpected_status_report(response: &ApiResponse, expected: u16) -> Vec<String> {
    let mut lines = vec![format!("Expected status code {}, got {}", expected, response.status)];

    match response.json() {
        Some(json) if response.is_json_content() => {
            let pretty = serde_json::to_string_pretty(json).unwrap_or_else(|_| response.text.clone());
            lines.push(format!("Response body: {}", pretty));
        }
        _ => {
            let preview: String = response.text.chars().take(TEXT_PREVIEW_CHARS).collect();
            lines.push(format!("Response text: {}...", preview));
        }
    }

    lines
}
