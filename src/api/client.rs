use async_trait::async_trait;
use log::{debug, warn};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client as HttpClient, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

use crate::api::error::ApiError;
use crate::api::models::{CreateMessageRequest, FieldError, Message, MessageFilter};
use crate::utils::endpoint_url;

const MESSAGES_PATH: &str = "messages";

/// What the sync core needs from the backend. Implementations must not
/// retry on their own; every failure comes back as an [`ApiError`].
#[async_trait]
pub trait MessageTransport: Send + Sync {
    /// Messages matching `filter`, in whatever order the server chose.
    async fn fetch_messages(&self, filter: &MessageFilter) -> Result<Vec<Message>, ApiError>;

    /// Creates a message and returns the server's copy, with its assigned
    /// id and creation time.
    async fn create_message(&self, request: &CreateMessageRequest) -> Result<Message, ApiError>;
}

/// HTTP implementation talking to `<base>/messages` with a bearer token.
pub struct ApiClient {
    http: HttpClient,
    base_url: Url,
    token: String,
}

impl ApiClient {
    pub fn new(base_url: Url, token: impl Into<String>) -> Result<Self, ApiError> {
        let http = HttpClient::builder()
            .user_agent(concat!("chatline/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ApiError::wrap(base_url.as_str(), e))?;
        Ok(Self { http, base_url, token: token.into() })
    }

    fn endpoint(&self, path: &str) -> Result<(Url, String), ApiError> {
        let url = endpoint_url(&self.base_url, path).map_err(|e| ApiError::wrap(path, e))?;
        let name = url.path().to_string();
        Ok((url, name))
    }

    fn with_auth(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        req.bearer_auth(&self.token)
    }
}

#[async_trait]
impl MessageTransport for ApiClient {
    async fn fetch_messages(&self, filter: &MessageFilter) -> Result<Vec<Message>, ApiError> {
        let (url, endpoint) = self.endpoint(MESSAGES_PATH)?;
        debug!("GET {endpoint} {filter:?}");
        let req = self.with_auth(self.http.get(url).query(filter));
        let resp = req.send().await.map_err(|e| ApiError::wrap(&endpoint, e))?;
        match read_payload(&endpoint, resp).await? {
            Some(body) => decode(&endpoint, &body),
            None => Ok(Vec::new()),
        }
    }

    async fn create_message(&self, request: &CreateMessageRequest) -> Result<Message, ApiError> {
        let (url, endpoint) = self.endpoint(MESSAGES_PATH)?;
        debug!("POST {endpoint}");
        let req = self.with_auth(self.http.post(url).json(request));
        let resp = req.send().await.map_err(|e| ApiError::wrap(&endpoint, e))?;
        match read_payload(&endpoint, resp).await? {
            Some(body) => decode(&endpoint, &body),
            None => Err(ApiError::network(endpoint, "server returned no message")),
        }
    }
}

/// Body of a 2xx response, or `None` for 204 / empty bodies.
/// Non-2xx responses are turned into the matching [`ApiError`].
async fn read_payload(endpoint: &str, resp: Response) -> Result<Option<String>, ApiError> {
    let status = resp.status();
    let is_json = resp
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.contains("json"));

    if !status.is_success() {
        let body = resp.text().await.ok();
        let err = error_from_body(endpoint, status, is_json, body.as_deref());
        warn!("{err}");
        return Err(err);
    }
    if status == StatusCode::NO_CONTENT {
        return Ok(None);
    }
    let body = resp.text().await.map_err(|e| ApiError::wrap(endpoint, e))?;
    if body.trim().is_empty() { Ok(None) } else { Ok(Some(body)) }
}

fn decode<T: DeserializeOwned>(endpoint: &str, body: &str) -> Result<T, ApiError> {
    serde_json::from_str(body)
        .map_err(|e| ApiError::network(endpoint, format!("invalid response body: {e}")))
}

fn status_text(status: StatusCode) -> String {
    status.canonical_reason().map(str::to_string).unwrap_or_else(|| status.to_string())
}

/// Maps a non-2xx response to an error. JSON bodies (when the content type
/// says so) supply the message and, on a 400, field errors; other bodies
/// are used verbatim. Anything unusable falls back to the status text.
pub(crate) fn error_from_body(
    endpoint: &str,
    status: StatusCode,
    is_json: bool,
    body: Option<&str>,
) -> ApiError {
    let fallback = status_text(status);
    let body = body.map(str::trim).filter(|b| !b.is_empty());

    let (message, fields) = match body {
        None => (fallback, Vec::new()),
        Some(text) if is_json => match serde_json::from_str::<Value>(text) {
            Ok(json) => interpret_json(json, fallback),
            Err(_) => (fallback, Vec::new()),
        },
        Some(text) => (text.to_string(), Vec::new()),
    };

    let endpoint = endpoint.to_string();
    if status == StatusCode::BAD_REQUEST && !fields.is_empty() {
        ApiError::Validation { endpoint, message, fields }
    } else {
        ApiError::Http { endpoint, status: status.as_u16(), message }
    }
}

fn interpret_json(json: Value, fallback: String) -> (String, Vec<FieldError>) {
    match json {
        Value::Array(items) => (fallback, field_list(Value::Array(items))),
        Value::Object(ref obj) => {
            let message = obj
                .get("message")
                .or_else(|| obj.get("error"))
                .and_then(|v| v.as_str())
                .map(str::to_string)
                .unwrap_or(fallback);
            let fields = obj.get("errors").cloned().map(field_list).unwrap_or_default();
            (message, fields)
        }
        Value::String(s) if !s.trim().is_empty() => (s, Vec::new()),
        _ => (fallback, Vec::new()),
    }
}

fn field_list(json: Value) -> Vec<FieldError> {
    serde_json::from_value(json).unwrap_or_default()
}
