//! Request dispatch seam
//!
//! Everything above this trait deals in [`ApiRequest`] and [`ApiResponse`];
//! only [`HttpDispatcher`] knows about URLs and reqwest.

use std::time::Duration;

use async_trait::async_trait;
use lingua_domain::ApiConfig;
use serde_json::Value;
use tracing::{debug, instrument};

use super::errors::ApiError;
use super::request::{ApiRequest, ApiResponse};
use crate::http::HttpClient;

/// Sends one request and classifies the outcome.
///
/// A 2xx response is `Ok`. Any other response becomes [`ApiError::Http`]
/// carrying the parsed body; a request that got no response at all becomes
/// [`ApiError::Network`].
#[async_trait]
pub trait Dispatcher: Send + Sync {
    async fn dispatch(&self, request: &ApiRequest) -> Result<ApiResponse, ApiError>;
}

/// Dispatcher backed by [`HttpClient`]
#[derive(Clone)]
pub struct HttpDispatcher {
    http: HttpClient,
    base_url: String,
}

impl HttpDispatcher {
    /// Dispatcher resolving request paths against `base_url`.
    ///
    /// A trailing slash on `base_url` is dropped.
    pub fn new(base_url: impl Into<String>, http: HttpClient) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http, base_url }
    }

    /// Dispatcher with timeout and attempts taken from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Config`] if the HTTP client cannot be built.
    pub fn from_config(config: &ApiConfig) -> Result<Self, ApiError> {
        let http = HttpClient::builder()
            .timeout(config.timeout())
            .max_attempts(config.max_attempts)
            .base_backoff(Duration::from_millis(200))
            .user_agent(concat!("lingua/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self::new(config.base_url.clone(), http))
    }

    /// Base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }
}

#[async_trait]
impl Dispatcher for HttpDispatcher {
    #[instrument(skip(self, request), fields(method = %request.method, path = %request.path, retry = request.is_retry))]
    async fn dispatch(&self, request: &ApiRequest) -> Result<ApiResponse, ApiError> {
        let mut builder = self
            .http
            .request(request.method.clone(), self.url(&request.path))
            .headers(request.headers.clone());

        let pairs = request.query.pairs();
        if !pairs.is_empty() {
            builder = builder.query(&pairs);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = self.http.send(builder).await?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|err| ApiError::Network(format!("failed to read response body: {err}")))?;
        let body = parse_body(&text);

        debug!(status = status.as_u16(), "api response");

        if status.is_success() {
            Ok(ApiResponse { status: status.as_u16(), body })
        } else {
            Err(ApiError::Http { status: status.as_u16(), body })
        }
    }
}

/// Empty bodies become `Null`, non-JSON text is kept as a JSON string.
fn parse_body(text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

#[cfg(test)]
mod tests {
    use reqwest::Method;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::api::request::Query;

    fn dispatcher(server: &MockServer) -> HttpDispatcher {
        let config = ApiConfig { base_url: format!("{}/api/", server.uri()), ..Default::default() };
        HttpDispatcher::from_config(&config).expect("dispatcher")
    }

    #[test]
    fn parse_body_variants() {
        assert_eq!(parse_body(""), Value::Null);
        assert_eq!(parse_body("{\"a\":1}"), json!({ "a": 1 }));
        assert_eq!(parse_body("Bad Gateway"), json!("Bad Gateway"));
    }

    #[tokio::test]
    async fn sends_query_headers_and_json_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/reviews/"))
            .and(query_param("lesson", "4"))
            .and(header("accept-language", "es"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": 9 })))
            .expect(1)
            .mount(&server)
            .await;

        let mut request = ApiRequest::new(Method::POST, "/reviews/")
            .with_query(Query::new().with("lesson", 4))
            .with_body(Some(json!({ "rating": 5 })));
        request.headers.insert("accept-language", "es".parse().unwrap());

        let response = dispatcher(&server).dispatch(&request).await.unwrap();
        assert_eq!(response.status, 201);
        assert_eq!(response.body, json!({ "id": 9 }));
    }

    #[tokio::test]
    async fn non_success_carries_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/languages/"))
            .respond_with(
                ResponseTemplate::new(400).set_body_json(json!({ "code": ["must be unique"] })),
            )
            .mount(&server)
            .await;

        let err = dispatcher(&server)
            .dispatch(&ApiRequest::new(Method::POST, "/languages/"))
            .await
            .unwrap_err();

        assert_eq!(err, ApiError::Http { status: 400, body: json!({ "code": ["must be unique"] }) });
    }

    #[tokio::test]
    async fn no_content_yields_null_body() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/words/3/"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let response = dispatcher(&server)
            .dispatch(&ApiRequest::new(Method::DELETE, "/words/3/"))
            .await
            .unwrap();
        assert_eq!(response.body, Value::Null);
    }
}
