use reqwest::Url;
use reqwest::header::CONTENT_TYPE;
use serde_json::Value;
use std::time::{Duration, Instant};

use super::error::ApiError;
use super::method::HttpMethod;
use super::request::ApiRequest;
use super::response::ApiResponse;

/// Where the service lives and how long to wait for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    /// Per-request timeout. `0` leaves the library default in place.
    pub timeout_ms: u64,
}

/// Moves one request to the service and back.
pub trait Transport {
    fn send(&self, request: &ApiRequest) -> Result<ApiResponse, ApiError>;

    fn base_url(&self) -> &str;
}

/// Blocking `reqwest` transport against a live server.
pub struct HttpTransport {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let base_url = config.base_url.trim_end_matches('/').to_string();
        Url::parse(&base_url).map_err(|e| ApiError::InvalidUrl {
            url: config.base_url.clone(),
            reason: e.to_string(),
        })?;

        let mut builder = reqwest::blocking::Client::builder();
        if config.timeout_ms > 0 {
            builder = builder.timeout(Duration::from_millis(config.timeout_ms));
        }
        let client = builder
            .build()
            .map_err(|e| ApiError::Request(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self { client, base_url })
    }

    fn url_for(&self, path: &str) -> Result<Url, ApiError> {
        let raw = format!("{}{path}", self.base_url);
        Url::parse(&raw).map_err(|e| ApiError::InvalidUrl {
            url: raw.clone(),
            reason: e.to_string(),
        })
    }
}

impl Transport for HttpTransport {
    fn send(&self, request: &ApiRequest) -> Result<ApiResponse, ApiError> {
        let url = self.url_for(&request.path)?;
        let mut req_builder = self.client.request(request.method.into(), url.clone());
        if let Some(payload) = &request.payload {
            req_builder = req_builder
                .header(CONTENT_TYPE, payload.content_type())
                .body(payload.body_text());
        }

        let started = Instant::now();
        let response = req_builder.send().map_err(|e| classify(&url, e))?;
        let status = response.status().as_u16();
        let bytes = response
            .bytes()
            .map_err(|e| ApiError::Request(format!("Failed to read response: {e}")))?;

        Ok(ApiResponse {
            status,
            body: String::from_utf8_lossy(&bytes).into_owned(),
            duration_ms: started.elapsed().as_millis(),
        })
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }
}

fn classify(url: &Url, error: reqwest::Error) -> ApiError {
    if error.is_timeout() {
        ApiError::Timeout {
            url: url.to_string(),
        }
    } else if error.is_connect() {
        ApiError::Unreachable {
            url: url.to_string(),
            source: Box::new(error),
        }
    } else {
        ApiError::Request(error.to_string())
    }
}

/// Thin wrapper over a [`Transport`] offering one call per verb.
pub struct ApiClient {
    transport: Box<dyn Transport>,
}

impl ApiClient {
    pub fn connect(config: &ClientConfig) -> Result<Self, ApiError> {
        Ok(Self::with_transport(HttpTransport::new(config)?))
    }

    pub fn with_transport(transport: impl Transport + 'static) -> Self {
        Self {
            transport: Box::new(transport),
        }
    }

    pub fn base_url(&self) -> &str {
        self.transport.base_url()
    }

    pub fn send(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        let result = self.transport.send(&request);
        match &result {
            Ok(response) => tracing::debug!(
                method = %request.method,
                path = %request.path,
                status = response.status,
                duration_ms = response.duration_ms as u64,
                "request completed"
            ),
            Err(error) => tracing::debug!(
                method = %request.method,
                path = %request.path,
                %error,
                "request failed"
            ),
        }
        result
    }

    pub fn call(&self, method: HttpMethod, path: &str) -> Result<ApiResponse, ApiError> {
        self.send(ApiRequest::new(method, path))
    }

    pub fn get(&self, path: &str) -> Result<ApiResponse, ApiError> {
        self.call(HttpMethod::Get, path)
    }

    pub fn head(&self, path: &str) -> Result<ApiResponse, ApiError> {
        self.call(HttpMethod::Head, path)
    }

    pub fn options(&self, path: &str) -> Result<ApiResponse, ApiError> {
        self.call(HttpMethod::Options, path)
    }

    pub fn delete(&self, path: &str) -> Result<ApiResponse, ApiError> {
        self.call(HttpMethod::Delete, path)
    }

    pub fn post_json(&self, path: &str, body: &Value) -> Result<ApiResponse, ApiError> {
        self.send(ApiRequest::new(HttpMethod::Post, path).with_json(body.clone()))
    }

    pub fn put_json(&self, path: &str, body: &Value) -> Result<ApiResponse, ApiError> {
        self.send(ApiRequest::new(HttpMethod::Put, path).with_json(body.clone()))
    }

    pub fn patch_json(&self, path: &str, body: &Value) -> Result<ApiResponse, ApiError> {
        self.send(ApiRequest::new(HttpMethod::Patch, path).with_json(body.clone()))
    }

    pub fn post_raw(&self, path: &str, content_type: &str, body: &str) -> Result<ApiResponse, ApiError> {
        self.send(ApiRequest::new(HttpMethod::Post, path).with_raw(content_type, body))
    }

    /// Liveness probe: `GET /` must answer `200`.
    pub fn ensure_ready(&self) -> Result<(), ApiError> {
        let response = self.get("/")?;
        if response.status == 200 {
            Ok(())
        } else {
            Err(ApiError::NotReady {
                status: response.status,
            })
        }
    }

    pub fn is_reachable(&self) -> bool {
        self.ensure_ready().is_ok()
    }

    /// Asks the service to stop. The server may drop the connection while
    /// exiting, so a connection failure counts as success.
    pub fn shutdown(&self) -> Result<(), ApiError> {
        match self.get("/shutdown") {
            Ok(_) => Ok(()),
            Err(ApiError::Unreachable { .. }) => Ok(()),
            Err(error) => Err(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::net::TcpListener;
    use std::sync::mpsc;
    use std::thread;

    struct Captured {
        method: String,
        url: String,
        content_type: Option<String>,
        body: String,
    }

    /// Serves `count` requests with the given status and body, reporting
    /// what it saw.
    fn serve(count: usize, status: u16, body: &'static str) -> (String, mpsc::Receiver<Captured>) {
        let server = tiny_http::Server::http("127.0.0.1:0").unwrap();
        let port = server.server_addr().to_ip().unwrap().port();
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            for _ in 0..count {
                let mut request = server.recv().unwrap();
                let mut received = String::new();
                request.as_reader().read_to_string(&mut received).unwrap();
                let content_type = request
                    .headers()
                    .iter()
                    .find(|header| header.field.equiv("Content-Type"))
                    .map(|header| header.value.as_str().to_string());
                tx.send(Captured {
                    method: request.method().to_string(),
                    url: request.url().to_string(),
                    content_type,
                    body: received,
                })
                .unwrap();
                let response = tiny_http::Response::from_string(body)
                    .with_status_code(tiny_http::StatusCode(status));
                request.respond(response).unwrap();
            }
        });

        (format!("http://127.0.0.1:{port}"), rx)
    }

    fn client_for(base_url: &str, timeout_ms: u64) -> ApiClient {
        ApiClient::connect(&ClientConfig {
            base_url: base_url.to_string(),
            timeout_ms,
        })
        .unwrap()
    }

    #[test]
    fn post_json_sends_body_and_content_type() {
        let (base_url, rx) = serve(1, 201, r#"{"id":"7","title":"Test Todo"}"#);
        let client = client_for(&base_url, 0);

        let response = client
            .post_json("/todos", &json!({"title": "Test Todo"}))
            .unwrap();

        assert_eq!(response.status, 201);
        assert_eq!(response.id().as_deref(), Some("7"));
        let seen = rx.recv().unwrap();
        assert_eq!(seen.method, "POST");
        assert_eq!(seen.url, "/todos");
        assert_eq!(seen.content_type.as_deref(), Some("application/json"));
        assert_eq!(seen.body, r#"{"title":"Test Todo"}"#);
    }

    #[test]
    fn raw_bodies_keep_their_content_type() {
        let (base_url, rx) = serve(1, 400, "");
        let client = client_for(&format!("{base_url}/"), 0);

        let response = client
            .post_raw("/todos", "application/xml", "<todos><title>title</todos>")
            .unwrap();

        assert_eq!(response.status, 400);
        let seen = rx.recv().unwrap();
        assert_eq!(seen.url, "/todos");
        assert_eq!(seen.content_type.as_deref(), Some("application/xml"));
        assert_eq!(seen.body, "<todos><title>title</todos>");
    }

    #[test]
    fn every_verb_reaches_the_server() {
        let (base_url, rx) = serve(HttpMethod::ALL.len(), 405, "");
        let client = client_for(&base_url, 0);

        for method in HttpMethod::ALL {
            let response = client.call(method, "/todos/1").unwrap();
            assert_eq!(response.status, 405);
            assert_eq!(rx.recv().unwrap().method, method.as_str());
        }
    }

    #[test]
    fn ensure_ready_rejects_non_200() {
        let (base_url, _rx) = serve(1, 503, "");
        let client = client_for(&base_url, 0);

        let err = client.ensure_ready().unwrap_err();
        assert!(matches!(err, ApiError::NotReady { status: 503 }));
    }

    #[test]
    fn closed_port_is_reported_unreachable() {
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let client = client_for(&format!("http://127.0.0.1:{port}"), 2_000);

        let err = client.get("/").unwrap_err();
        assert!(err.is_unreachable(), "unexpected error: {err}");
        assert!(std::error::Error::source(&err).is_some());
        assert!(!client.is_reachable());
        assert!(client.shutdown().is_ok());
    }

    #[test]
    fn shutdown_reports_a_dropped_connection() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut buffer = [0u8; 1024];
            let _ = std::io::Read::read(&mut stream, &mut buffer);
        });
        let client = client_for(&format!("http://127.0.0.1:{port}"), 2_000);

        let result = client.shutdown();
        assert!(matches!(result, Err(ApiError::Request(_))), "unexpected result: {result:?}");
    }

    #[test]
    fn slow_server_times_out() {
        let server = tiny_http::Server::http("127.0.0.1:0").unwrap();
        let port = server.server_addr().to_ip().unwrap().port();
        thread::spawn(move || {
            let request = server.recv().unwrap();
            thread::sleep(Duration::from_millis(1_500));
            drop(request);
        });
        let client = client_for(&format!("http://127.0.0.1:{port}"), 200);

        let err = client.get("/todos").unwrap_err();
        assert!(matches!(err, ApiError::Timeout { .. }), "unexpected error: {err}");
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let result = ApiClient::connect(&ClientConfig {
            base_url: "not a url".into(),
            timeout_ms: 0,
        });
        assert!(matches!(result, Err(ApiError::InvalidUrl { .. })));
    }
}
