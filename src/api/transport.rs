//! Request transport for the user API.

use crate::config::RuntimeConfig;
use crate::error::TransportError;
use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// One JSON request relative to the API origin.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    /// Absolute path, e.g. `/api/users/1`.
    pub path: String,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            path: path.into(),
            body: None,
        }
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self {
            method: Method::POST,
            path: path.into(),
            body: Some(body),
        }
    }

    pub fn put(path: impl Into<String>, body: Value) -> Self {
        Self {
            method: Method::PUT,
            path: path.into(),
            body: Some(body),
        }
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self {
            method: Method::DELETE,
            path: path.into(),
            body: None,
        }
    }
}

/// Sends a request and returns the decoded JSON body.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: ApiRequest) -> Result<Value, TransportError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn send(&self, request: ApiRequest) -> Result<Value, TransportError> {
        (**self).send(request).await
    }
}

/// reqwest-backed transport.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    origin: String,
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(origin: impl Into<String>, timeout: Duration) -> Result<Self, TransportError> {
        let origin = origin.into().trim_end_matches('/').to_string();
        Url::parse(&origin)?;
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { origin, client })
    }

    /// Resolve the project configuration once and target its origin.
    pub fn from_config(config: &RuntimeConfig) -> Result<Self, TransportError> {
        let project = config.resolve()?;
        Self::new(
            config.request_origin(&project),
            Duration::from_millis(project.timeout),
        )
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    fn url(&self, path: &str) -> Result<Url, TransportError> {
        Ok(Url::parse(&format!("{}{}", self.origin, path))?)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: ApiRequest) -> Result<Value, TransportError> {
        let url = self.url(&request.path)?;
        debug!(method = %request.method, url = %url, "sending API request");

        let mut builder = self.client.request(request.method, url);
        if let Some(body) = request.body.as_ref() {
            builder = builder.json(body);
        }

        let resp = builder.send().await?;
        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(TransportError::Status { status, body });
        }
        Ok(resp.json().await?)
    }
}
