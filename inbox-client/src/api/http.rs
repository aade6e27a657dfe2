//! REST executor backed by `reqwest`.

use super::{ApiExecutor, ApiRequest, ApiResponse, Method};
use crate::transport::TransportError;
use async_trait::async_trait;
use std::time::Duration;

/// Sends [`ApiRequest`]s over HTTP(S).
///
/// The token is placed verbatim in the `Authorization` header.
#[derive(Debug, Clone)]
pub struct ReqwestExecutor {
    client: reqwest::Client,
    base_url: String,
}

impl ReqwestExecutor {
    /// Create an executor for the given base URL.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.to_string(),
        })
    }

    /// Full URL for a request path.
    pub fn url_for(&self, path: &str) -> String {
        join_url(&self.base_url, path)
    }
}

#[async_trait]
impl ApiExecutor for ReqwestExecutor {
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
        };

        let mut builder = self
            .client
            .request(method, self.url_for(&request.path))
            .query(&request.query);
        if let Some(token) = &request.authorization {
            builder = builder.header(reqwest::header::AUTHORIZATION, token.expose());
        }

        let response = builder.send().await.map_err(map_reqwest_error)?;
        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(map_reqwest_error)?;

        tracing::debug!(path = %request.path, status, "inbox API request completed");

        Ok(ApiResponse {
            status,
            body: body.to_vec(),
        })
    }
}

fn map_reqwest_error(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout
    } else if err.is_connect() {
        TransportError::ConnectionFailed(err.to_string())
    } else {
        TransportError::RequestFailed(err.to_string())
    }
}

/// Join a base URL and an absolute path without doubling the slash.
fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
