//! REST request executor abstraction.
//!
//! The synchronization core builds [`ApiRequest`]s and hands them to an
//! [`ApiExecutor`]; the executor performs the HTTP exchange and returns
//! the raw status and body. Status interpretation (401 invalidation,
//! 404 mapping) stays in [`crate::client`].

mod mock;

#[cfg(feature = "http")]
mod http;

#[cfg(feature = "http")]
pub use http::ReqwestExecutor;
pub use mock::MockApi;

use async_trait::async_trait;
use inbox_types::{AuthToken, NotificationId, ID_QUERY_PARAM};
use serde::Serialize;

use crate::transport::TransportError;

/// HTTP methods used by the inbox API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// `GET`
    Get,
    /// `PATCH`
    Patch,
    /// `DELETE`
    Delete,
}

/// A request to the inbox REST API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest {
    /// HTTP method.
    pub method: Method,
    /// Path relative to the configured base URL.
    pub path: String,
    /// Query parameters, in order.
    pub query: Vec<(String, String)>,
    /// Value for the `Authorization` header.
    pub authorization: Option<AuthToken>,
}

impl ApiRequest {
    /// Create a request without query or authorization.
    pub fn new(method: Method, path: &str) -> Self {
        Self {
            method,
            path: path.to_string(),
            query: Vec::new(),
            authorization: None,
        }
    }

    /// Address a single notification via `?id=`.
    pub fn with_id(mut self, id: &NotificationId) -> Self {
        self.query
            .push((ID_QUERY_PARAM.to_string(), id.as_str().to_string()));
        self
    }

    /// Attach the authorization token.
    pub fn authorized(mut self, token: AuthToken) -> Self {
        self.authorization = Some(token);
        self
    }

    /// The `id` query parameter, if present.
    pub fn id(&self) -> Option<&str> {
        self.query
            .iter()
            .find(|(key, _)| key == ID_QUERY_PARAM)
            .map(|(_, value)| value.as_str())
    }
}

/// Raw response from the inbox REST API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body.
    pub body: Vec<u8>,
}

impl ApiResponse {
    /// Response with a status and an empty body.
    pub fn status(status: u16) -> Self {
        Self {
            status,
            body: Vec::new(),
        }
    }

    /// `200 OK` with a JSON body.
    pub fn json<T: Serialize>(value: &T) -> Result<Self, serde_json::Error> {
        Ok(Self {
            status: 200,
            body: serde_json::to_vec(value)?,
        })
    }

    /// Check for a 2xx status.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Executes REST requests against the inbox server.
#[async_trait]
pub trait ApiExecutor: Send + Sync {
    /// Perform the request and return the raw response.
    ///
    /// Only transport-level failures are errors; any HTTP status is
    /// returned as a response.
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, TransportError>;
}
