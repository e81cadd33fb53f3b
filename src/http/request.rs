use serde_json::Value;

use super::method::HttpMethod;

pub const JSON_CONTENT_TYPE: &str = "application/json";
pub const XML_CONTENT_TYPE: &str = "application/xml";

/// Body sent with a request. Raw bodies are passed through untouched so
/// malformed documents can be submitted on purpose.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Json(Value),
    Raw { content_type: String, body: String },
}

impl Payload {
    pub fn content_type(&self) -> &str {
        match self {
            Payload::Json(_) => JSON_CONTENT_TYPE,
            Payload::Raw { content_type, .. } => content_type,
        }
    }

    pub fn body_text(&self) -> String {
        match self {
            Payload::Json(value) => value.to_string(),
            Payload::Raw { body, .. } => body.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: HttpMethod,
    /// Path relative to the base URL, always starting with `/`.
    pub path: String,
    pub payload: Option<Payload>,
}

impl ApiRequest {
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        let path = path.into();
        let path = if path.starts_with('/') { path } else { format!("/{path}") };
        Self {
            method,
            path,
            payload: None,
        }
    }

    pub fn with_json(mut self, value: Value) -> Self {
        self.payload = Some(Payload::Json(value));
        self
    }

    pub fn with_raw(mut self, content_type: impl Into<String>, body: impl Into<String>) -> Self {
        self.payload = Some(Payload::Raw {
            content_type: content_type.into(),
            body: body.into(),
        });
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn new_prefixes_missing_slash() {
        let request = ApiRequest::new(HttpMethod::Get, "todos/1");
        assert_eq!(request.path, "/todos/1");
        assert!(request.payload.is_none());
    }

    #[test]
    fn json_payload_serializes_compactly() {
        let request = ApiRequest::new(HttpMethod::Post, "/todos").with_json(json!({"title": "a"}));
        let payload = request.payload.unwrap();
        assert_eq!(payload.content_type(), JSON_CONTENT_TYPE);
        assert_eq!(payload.body_text(), r#"{"title":"a"}"#);
    }

    #[test]
    fn raw_payload_is_passed_through() {
        let body = "<todos><title>title</todos>";
        let request = ApiRequest::new(HttpMethod::Post, "/todos").with_raw(XML_CONTENT_TYPE, body);
        let payload = request.payload.unwrap();
        assert_eq!(payload.content_type(), XML_CONTENT_TYPE);
        assert_eq!(payload.body_text(), body);
    }
}
