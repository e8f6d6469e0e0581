use std::sync::Arc;

use serde_json::Value;
use spadesk_api::{ApiRequest, ApiResponse, Method, SpaError, Transport, TransportError};

use crate::request::RequestPipeline;
use crate::response::ResponsePipeline;

/// Every call goes decorate -> transport -> observe.
pub struct ApiClient {
    transport: Arc<dyn Transport>,
    requests: RequestPipeline,
    responses: ResponsePipeline,
}

impl ApiClient {
    pub fn new(
        transport: Arc<dyn Transport>,
        requests: RequestPipeline,
        responses: ResponsePipeline,
    ) -> Self {
        Self {
            transport,
            requests,
            responses,
        }
    }

    pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse, SpaError> {
        let outcome = self.dispatch(request).await;
        self.responses.observe(outcome)
    }

    /// Same as [`send`](Self::send), but failures are not announced to the
    /// user. For flows that word their own failure message.
    pub async fn send_quietly(&self, request: ApiRequest) -> Result<ApiResponse, SpaError> {
        let outcome = self.dispatch(request).await;
        self.responses.observe_quietly(outcome)
    }

    async fn dispatch(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        let request = self.requests.decorate(request);
        tracing::debug!(
            method = request.method.as_str(),
            path = %request.path,
            "dispatching request"
        );
        self.transport.send(request).await
    }

    pub async fn get(&self, path: &str) -> Result<Value, SpaError> {
        self.body_of(ApiRequest::new(Method::Get, path)).await
    }

    pub async fn post(&self, path: &str, body: Value) -> Result<Value, SpaError> {
        self.body_of(ApiRequest::new(Method::Post, path).with_body(body))
            .await
    }

    pub async fn put(&self, path: &str, body: Value) -> Result<Value, SpaError> {
        self.body_of(ApiRequest::new(Method::Put, path).with_body(body))
            .await
    }

    pub async fn delete(&self, path: &str) -> Result<Value, SpaError> {
        self.body_of(ApiRequest::new(Method::Delete, path)).await
    }

    async fn body_of(&self, request: ApiRequest) -> Result<Value, SpaError> {
        Ok(self.send(request).await?.body)
    }
}
