use serde::{Deserialize, Serialize};

/// A message as the server sends it. `created_at` is the raw ISO-8601 string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub message: String,
    pub author: String,
    pub created_at: String,
}

/// Outbound payload for `POST /messages`. Never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateMessageRequest {
    pub message: String,
    pub author: String,
}

impl CreateMessageRequest {
    pub fn new(author: impl Into<String>, message: impl Into<String>) -> Self {
        Self { message: message.into(), author: author.into() }
    }
}

/// Query parameters for `GET /messages`. Absent fields are left off the URL.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MessageFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub after: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub before: Option<String>,
}

impl MessageFilter {
    pub fn with_limit(limit: usize) -> Self {
        Self { limit: Some(limit), ..Self::default() }
    }
}

/// One entry of a 400 validation body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}
