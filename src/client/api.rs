use std::time::Duration;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{RequestBuilder, Response};
use tracing::debug;

use crate::config::Config;
use crate::error::{AttendanceError, Result};

/// HTTP access to the remote attendance API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AttendanceError::Config(format!("cliente HTTP: {}", e)))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(&config.api_base_url, config.request_timeout)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn get(&self, path: &str, token: &str) -> Result<RequestBuilder> {
        let url = self.url(path);
        debug!(url = %url, "GET");
        Ok(self.client.get(url).headers(headers(Some(token))?))
    }

    pub(crate) fn post(&self, path: &str, token: Option<&str>) -> Result<RequestBuilder> {
        let url = self.url(path);
        debug!(url = %url, "POST");
        Ok(self.client.post(url).headers(headers(token)?))
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

fn headers(token: Option<&str>) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    if let Some(token) = token {
        let value = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|_| AttendanceError::Validation("token de sesión inválido".to_string()))?;
        headers.insert(AUTHORIZATION, value);
    }
    Ok(headers)
}

/// Sends the request; no response at all is a connectivity error.
pub(crate) async fn send(request: RequestBuilder) -> Result<Response> {
    request.send().await.map_err(AttendanceError::Connectivity)
}

/// Turns a non-2xx response into `ServerRejected` carrying the server detail.
pub(crate) async fn ensure_success(res: Response) -> Result<Response> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }
    let detail = read_detail(res)
        .await
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("Error").to_string());
    Err(AttendanceError::ServerRejected { status, detail })
}

/// Extracts `detail` from an error body. Validation errors carry a list
/// instead of a string; those are rendered as JSON text.
pub(crate) async fn read_detail(res: Response) -> Option<String> {
    let body = res.text().await.ok()?;
    let value: serde_json::Value = serde_json::from_str(&body).ok()?;
    match value.get("detail")? {
        serde_json::Value::String(detail) if !detail.is_empty() => Some(detail.clone()),
        serde_json::Value::String(_) | serde_json::Value::Null => None,
        other => Some(other.to_string()),
    }
}

pub(crate) async fn read_json<T: serde::de::DeserializeOwned>(res: Response) -> Result<T> {
    let body = res.bytes().await.map_err(AttendanceError::Connectivity)?;
    serde_json::from_slice(&body).map_err(|e| AttendanceError::UnexpectedResponse(e.to_string()))
}
