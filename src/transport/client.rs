//! HTTP client for the content-generation service

use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method, Response, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};
use uuid::Uuid;

use super::error::{RequestError, from_error_body};
use crate::config::ClientConfig;
use crate::observability::Metrics;

pub type Result<T> = std::result::Result<T, RequestError>;

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Per-call options merged over the client defaults
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub body: Option<serde_json::Value>,
    /// Extra headers; they replace defaults with the same name
    pub headers: Vec<(String, String)>,
    /// Overrides the client-wide request timeout
    pub timeout: Option<Duration>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn json<B: Serialize>(body: &B) -> Result<Self> {
        let body = serde_json::to_value(body)
            .map_err(|e| RequestError::InvalidRequest(format!("Failed to encode body: {}", e)))?;
        Ok(Self {
            body: Some(body),
            ..Self::default()
        })
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// JSON client bound to one base path.
///
/// No retries happen here; retry policy belongs to the caller.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    /// Same settings minus the overall deadline, for long-lived streams
    stream_client: Client,
    base_url: String,
    api_token: Option<String>,
    metrics: Arc<Metrics>,
}

impl ApiClient {
    /// Create a new client from configuration
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout.as_duration())
            .timeout(config.request_timeout.as_duration())
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| RequestError::InvalidRequest(e.to_string()))?;

        let stream_client = Client::builder()
            .connect_timeout(config.connect_timeout.as_duration())
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| RequestError::InvalidRequest(e.to_string()))?;

        Ok(Self {
            client,
            stream_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_token: config.api_token.clone(),
            metrics: Arc::new(Metrics::new()),
        })
    }

    /// Share a metrics handle with other components
    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for an endpoint relative to the base path
    pub fn url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'))
    }

    /// Absolute URL built from path segments, each percent-encoded, so an
    /// id can never reach a different route
    pub fn segment_url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| RequestError::InvalidRequest(format!("Invalid base URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| RequestError::InvalidRequest("Base URL cannot carry a path".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    pub async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T> {
        self.request(Method::GET, endpoint, RequestOptions::new()).await
    }

    /// `GET` against a path whose segments may hold caller-supplied ids
    pub async fn get_segments<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T> {
        let url = self.segment_url(segments)?;
        let endpoint = url.path().to_string();
        let accept = mime::APPLICATION_JSON.as_ref();
        let response = self
            .send(&self.client, Method::GET, url.as_str(), &endpoint, RequestOptions::new(), accept)
            .await?;
        self.decode(response, &endpoint).await
    }

    pub async fn post<T: DeserializeOwned, B: Serialize>(&self, endpoint: &str, body: &B) -> Result<T> {
        self.request(Method::POST, endpoint, RequestOptions::json(body)?).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T> {
        self.request(Method::DELETE, endpoint, RequestOptions::new()).await
    }

    /// Send one request and decode the JSON body of a 2xx response
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        endpoint: &str,
        options: RequestOptions,
    ) -> Result<T> {
        let url = self.url(endpoint);
        let response = self
            .send(&self.client, method, &url, endpoint, options, mime::APPLICATION_JSON.as_ref())
            .await?;
        self.decode(response, endpoint).await
    }

    async fn decode<T: DeserializeOwned>(&self, response: Response, endpoint: &str) -> Result<T> {
        let bytes = response.bytes().await.map_err(RequestError::from)?;
        serde_json::from_slice(&bytes).map_err(|e| {
            self.metrics.request_failed();
            RequestError::Decode(format!("{} ({})", e, endpoint))
        })
    }

    /// Open a long-lived response whose body is consumed as a stream
    pub(crate) async fn open_stream(&self, endpoint: &str, accept: &str) -> Result<Response> {
        let url = self.url(endpoint);
        self.send(&self.stream_client, Method::GET, &url, endpoint, RequestOptions::new(), accept)
            .await
    }

    async fn send(
        &self,
        client: &Client,
        method: Method,
        url: &str,
        endpoint: &str,
        options: RequestOptions,
        accept: &str,
    ) -> Result<Response> {
        let request_id = Uuid::new_v4().to_string();
        let headers = self.merged_headers(&request_id, accept, &options.headers)?;

        let mut request = client.request(method.clone(), url).headers(headers);
        if let Some(body) = &options.body {
            request = request.json(body);
        }
        if let Some(timeout) = options.timeout {
            request = request.timeout(timeout);
        }

        debug!(%method, endpoint, request_id = %request_id, "Sending request");
        self.metrics.request_sent();
        let started = Instant::now();

        let response = request.send().await.map_err(|e| {
            self.metrics.request_failed();
            let err = RequestError::from(e);
            warn!(%method, endpoint, request_id = %request_id, error = %err, "Request failed");
            err
        })?;

        let status = response.status();
        debug!(
            %method,
            endpoint,
            request_id = %request_id,
            status = status.as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Response received"
        );

        if !status.is_success() {
            self.metrics.request_failed();
            let body = response.bytes().await.unwrap_or_default();
            return Err(from_error_body(status.as_u16(), &body));
        }

        Ok(response)
    }

    fn merged_headers(
        &self,
        request_id: &str,
        accept: &str,
        extra: &[(String, String)],
    ) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, header_value(mime::APPLICATION_JSON.as_ref())?);
        headers.insert(ACCEPT, header_value(accept)?);
        headers.insert(HeaderName::from_static(REQUEST_ID_HEADER), header_value(request_id)?);

        if let Some(token) = &self.api_token {
            headers.insert(AUTHORIZATION, header_value(&format!("Bearer {}", token))?);
        }

        for (name, value) in extra {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| RequestError::InvalidRequest(format!("Invalid header name '{}': {}", name, e)))?;
            headers.insert(name, header_value(value)?);
        }

        Ok(headers)
    }
}

fn header_value(value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|e| RequestError::InvalidRequest(format!("Invalid header value: {}", e)))
}
