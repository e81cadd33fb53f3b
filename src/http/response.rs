use serde_json::Value;

use super::error::ApiError;

/// Raw outcome of one call: the status code and the body as text.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
    pub duration_ms: u128,
}

impl ApiResponse {
    #[cfg(test)]
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            duration_ms: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    pub fn json(&self) -> Result<Value, ApiError> {
        serde_json::from_str(&self.body).map_err(ApiError::from)
    }

    /// The `id` field of a JSON object body, as text. The service sends ids
    /// as strings but numbers are accepted too.
    pub fn id(&self) -> Option<String> {
        let value = self.json().ok()?;
        match value.get("id")? {
            Value::String(id) => Some(id.clone()),
            Value::Number(id) => Some(id.to_string()),
            _ => None,
        }
    }

    /// Elements of the array stored under `key`, or nothing when the body is
    /// not JSON or has no such array.
    pub fn items(&self, key: &str) -> Vec<Value> {
        self.json()
            .ok()
            .and_then(|value| value.get(key).and_then(Value::as_array).cloned())
            .unwrap_or_default()
    }
}
