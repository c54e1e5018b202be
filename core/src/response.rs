//! The response envelope every Troia endpoint answers with.

use serde_json::{Map, Value};

use crate::error::ApiError;
use crate::http::HttpResponse;

/// Parsed view over one HTTP response.
///
/// Each of `status`, `timestamp`, `redirect`, and `result` is exactly the
/// value under that key in the JSON body, or `None` when the key is missing.
/// Nothing is checked or derived: whatever the service sent is passed through.
#[derive(Debug, Clone, PartialEq)]
pub struct TroiaResponse {
    http_status: u16,
    content: Map<String, Value>,
    status: Option<Value>,
    timestamp: Option<Value>,
    redirect: Option<Value>,
    result: Option<Value>,
}

impl TroiaResponse {
    pub fn from_http(response: HttpResponse) -> Result<Self, ApiError> {
        Self::from_body(response.status, &response.body)
    }

    /// Parse `body`. Fails unless it is a JSON object.
    pub fn from_body(http_status: u16, body: &str) -> Result<Self, ApiError> {
        let content = match serde_json::from_str::<Value>(body).map_err(ApiError::Parse)? {
            Value::Object(map) => map,
            other => return Err(ApiError::NotAnObject(json_type_name(&other))),
        };
        Ok(Self {
            http_status,
            status: content.get("status").cloned(),
            timestamp: content.get("timestamp").cloned(),
            redirect: content.get("redirect").cloned(),
            result: content.get("result").cloned(),
            content,
        })
    }

    pub fn status(&self) -> Option<&Value> {
        self.status.as_ref()
    }

    pub fn timestamp(&self) -> Option<&Value> {
        self.timestamp.as_ref()
    }

    pub fn redirect(&self) -> Option<&Value> {
        self.redirect.as_ref()
    }

    pub fn result(&self) -> Option<&Value> {
        self.result.as_ref()
    }

    /// `status` when the service sent it as a string.
    pub fn status_str(&self) -> Option<&str> {
        self.status.as_ref().and_then(Value::as_str)
    }

    /// `redirect` when the service sent it as a string.
    pub fn redirect_str(&self) -> Option<&str> {
        self.redirect.as_ref().and_then(Value::as_str)
    }

    /// The whole decoded body, including keys outside the envelope.
    pub fn content(&self) -> &Map<String, Value> {
        &self.content
    }

    /// HTTP status code of the response. Not interpreted by the client.
    pub fn http_status(&self) -> u16 {
        self.http_status
    }

    pub fn into_result(self) -> Option<Value> {
        self.result
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
