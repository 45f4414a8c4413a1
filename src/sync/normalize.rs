use chrono::{DateTime, NaiveDateTime};
use thiserror::Error;

use crate::api::models::Message;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("message {id} has an unreadable timestamp {created_at:?}")]
pub struct NormalizeError {
    pub id: String,
    pub created_at: String,
}

/// A wire message plus its creation time in epoch milliseconds, parsed once
/// on the way in. Only [`normalize`] builds one, so the two timestamps
/// always agree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayMessage {
    id: String,
    message: String,
    author: String,
    created_at: String,
    created_at_ms: i64,
}

impl DisplayMessage {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn created_at(&self) -> &str {
        &self.created_at
    }

    pub fn created_at_ms(&self) -> i64 {
        self.created_at_ms
    }
}

/// RFC 3339, or a zone-less `YYYY-MM-DDTHH:MM:SS[.fff]` read as UTC.
pub fn parse_timestamp(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.timestamp_millis());
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc().timestamp_millis())
}

pub fn normalize(message: Message) -> Result<DisplayMessage, NormalizeError> {
    let Some(created_at_ms) = parse_timestamp(&message.created_at) else {
        return Err(NormalizeError { id: message.id, created_at: message.created_at });
    };
    Ok(DisplayMessage {
        id: message.id,
        message: message.message,
        author: message.author,
        created_at: message.created_at,
        created_at_ms,
    })
}

/// Normalizes a batch, handing back the rejects separately.
pub fn normalize_batch(messages: Vec<Message>) -> (Vec<DisplayMessage>, Vec<NormalizeError>) {
    let mut ok = Vec::with_capacity(messages.len());
    let mut rejected = Vec::new();
    for message in messages {
        match normalize(message) {
            Ok(m) => ok.push(m),
            Err(e) => rejected.push(e),
        }
    }
    (ok, rejected)
}

#[cfg(test)]
pub(crate) fn display(id: &str, created_at: &str) -> DisplayMessage {
    normalize(Message {
        id: id.to_string(),
        message: format!("body {id}"),
        author: "tester".to_string(),
        created_at: created_at.to_string(),
    })
    .unwrap()
}
