//! Authenticated HTTP client bound to one provider base URL

use bytes::Bytes;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::multipart::Form;
use reqwest::{Client, Method, StatusCode};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use super::error::{DebridError, Result};

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            user_agent: "debridge/0.1.0".to_string(),
        }
    }
}

/// Credentials injected into every request
#[derive(Clone)]
pub enum Auth {
    None,
    Bearer(String),
    Basic { username: String, password: String },
}

impl std::fmt::Debug for Auth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Auth::None => write!(f, "None"),
            Auth::Bearer(_) => write!(f, "Bearer(***)"),
            Auth::Basic { username, .. } => write!(f, "Basic({username}:***)"),
        }
    }
}

/// Request body encodings used by providers
pub enum RequestBody {
    Empty,
    Json(Value),
    Form(Vec<(String, String)>),
    Multipart(Form),
    Raw(Bytes),
}

/// Response captured before provider-specific classification
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub body: Bytes,
}

impl RawResponse {
    /// Whether the response declares a JSON media type
    pub fn is_json(&self) -> bool {
        self.content_type
            .as_deref()
            .and_then(|ct| ct.parse::<mime::Mime>().ok())
            .map(|m| m.subtype() == mime::JSON || m.suffix() == Some(mime::JSON))
            .unwrap_or(false)
    }

    /// Body parsed as JSON, `None` when empty or not JSON
    pub fn json(&self) -> Option<Value> {
        if self.body.is_empty() {
            return None;
        }
        serde_json::from_slice(&self.body).ok()
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Provider request client
#[derive(Debug, Clone)]
pub struct RequestClient {
    client: Client,
    base_url: String,
    auth: Auth,
}

impl RequestClient {
    pub fn new(base_url: impl Into<String>, auth: Auth, config: &HttpConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| DebridError::Config(format!("failed to build HTTP client: {}", e)))?;

        let base_url = base_url.into().trim_end_matches('/').to_string();

        Ok(Self {
            client,
            base_url,
            auth,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send one request and capture the response without judging its status.
    ///
    /// Network failures map to [`DebridError::Transport`]; HTTP status codes are
    /// left to the caller's classifier.
    pub async fn send(&self, method: Method, path: &str, body: RequestBody) -> Result<RawResponse> {
        debug!(%method, path, "Provider request");

        let mut request = self
            .client
            .request(method.clone(), self.url(path))
            .header(ACCEPT, mime::APPLICATION_JSON.as_ref());

        request = match &self.auth {
            Auth::None => request,
            Auth::Bearer(token) => request.header(AUTHORIZATION, format!("Bearer {}", token)),
            Auth::Basic { username, password } => request.basic_auth(username, Some(password)),
        };

        request = match body {
            RequestBody::Empty => request,
            RequestBody::Json(value) => request.json(&value),
            RequestBody::Form(fields) => request.form(&fields),
            RequestBody::Multipart(form) => request.multipart(form),
            RequestBody::Raw(bytes) => request
                .header(CONTENT_TYPE, mime::APPLICATION_OCTET_STREAM.as_ref())
                .body(bytes),
        };

        let response = request.send().await?;

        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.bytes().await?;

        debug!(%method, path, status = status.as_u16(), size = body.len(), "Provider response");

        Ok(RawResponse {
            status,
            content_type,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(content_type: Option<&str>, body: &'static str) -> RawResponse {
        RawResponse {
            status: StatusCode::OK,
            content_type: content_type.map(str::to_string),
            body: Bytes::from_static(body.as_bytes()),
        }
    }

    #[test]
    fn test_http_config_defaults() {
        let config = HttpConfig::default();
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.user_agent, "debridge/0.1.0");
    }

    #[test]
    fn test_base_url_trailing_slash_stripped() {
        let client =
            RequestClient::new("http://localhost:8090/", Auth::None, &HttpConfig::default())
                .unwrap();
        assert_eq!(client.base_url(), "http://localhost:8090");
        assert_eq!(client.url("/torrents"), "http://localhost:8090/torrents");
    }

    #[test]
    fn test_json_content_type_detection() {
        assert!(raw(Some("application/json; charset=utf-8"), "{}").is_json());
        assert!(raw(Some("application/problem+json"), "{}").is_json());
        assert!(!raw(Some("text/plain"), "ok").is_json());
        assert!(!raw(None, "{}").is_json());
    }

    #[test]
    fn test_json_body_parsing() {
        assert_eq!(raw(None, r#"{"id":"X"}"#).json().unwrap()["id"], "X");
        assert!(raw(None, "").json().is_none());
        assert!(raw(None, "not json").json().is_none());
    }

    #[test]
    fn test_auth_debug_hides_secrets() {
        let auth = Auth::Basic {
            username: "user".into(),
            password: "hunter2".into(),
        };
        assert_eq!(format!("{:?}", auth), "Basic(user:***)");
        assert_eq!(format!("{:?}", Auth::Bearer("token".into())), "Bearer(***)");
    }
}
