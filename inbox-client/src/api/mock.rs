//! Mock REST executor for testing.
//!
//! Allows queueing responses and capturing requests for verification.

use super::{ApiExecutor, ApiRequest, ApiResponse};
use crate::transport::TransportError;
use async_trait::async_trait;
use inbox_types::{Notification, NotificationEnvelope, NotificationList};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Mock REST executor.
///
/// Responses are returned in the order they were queued. An empty queue
/// answers with a `RequestFailed` transport error.
#[derive(Debug, Default)]
pub struct MockApi {
    inner: Arc<Mutex<MockApiInner>>,
}

#[derive(Debug, Default)]
struct MockApiInner {
    requests: Vec<ApiRequest>,
    responses: VecDeque<Result<ApiResponse, TransportError>>,
}

impl MockApi {
    /// Create a new mock executor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response for a later request.
    pub fn queue_response(&self, response: ApiResponse) {
        let mut inner = self.inner.lock().unwrap();
        inner.responses.push_back(Ok(response));
    }

    /// Queue a bare status (empty body).
    pub fn queue_status(&self, status: u16) {
        self.queue_response(ApiResponse::status(status));
    }

    /// Queue a `GET /notifications` body.
    pub fn queue_list(&self, notifications: Vec<Notification>) {
        let body = NotificationList { notifications };
        self.queue_response(ApiResponse::json(&body).unwrap());
    }

    /// Queue a `GET /notification` body.
    pub fn queue_notification(&self, notification: Notification) {
        let body = NotificationEnvelope { notification };
        self.queue_response(ApiResponse::json(&body).unwrap());
    }

    /// Cause the next request to fail at the transport level.
    pub fn fail_next(&self, error: TransportError) {
        let mut inner = self.inner.lock().unwrap();
        inner.responses.push_back(Err(error));
    }

    /// All requests received so far.
    pub fn requests(&self) -> Vec<ApiRequest> {
        let inner = self.inner.lock().unwrap();
        inner.requests.clone()
    }

    /// The most recent request.
    pub fn last_request(&self) -> Option<ApiRequest> {
        let inner = self.inner.lock().unwrap();
        inner.requests.last().cloned()
    }
}

impl Clone for MockApi {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[async_trait]
impl ApiExecutor for MockApi {
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        let mut inner = self.inner.lock().unwrap();
        inner.requests.push(request);
        inner
            .responses
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::RequestFailed("no queued response".into())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Method;

    #[tokio::test]
    async fn returns_queued_responses_in_order() {
        let api = MockApi::new();
        api.queue_status(204);
        api.queue_status(404);

        let first = api.execute(ApiRequest::new(Method::Patch, "/notification")).await.unwrap();
        let second = api.execute(ApiRequest::new(Method::Delete, "/notification")).await.unwrap();

        assert_eq!(first.status, 204);
        assert_eq!(second.status, 404);
        assert_eq!(api.requests().len(), 2);
        assert_eq!(api.last_request().unwrap().method, Method::Delete);
    }

    #[tokio::test]
    async fn empty_queue_is_a_transport_failure() {
        let api = MockApi::new();
        let result = api.execute(ApiRequest::new(Method::Get, "/notifications")).await;
        assert!(matches!(result, Err(TransportError::RequestFailed(_))));
    }

    #[tokio::test]
    async fn forced_failure_is_returned() {
        let api = MockApi::new();
        api.fail_next(TransportError::Timeout);
        let result = api.execute(ApiRequest::new(Method::Get, "/notifications")).await;
        assert!(matches!(result, Err(TransportError::Timeout)));
    }
}
