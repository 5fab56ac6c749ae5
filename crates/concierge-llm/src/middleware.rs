use async_trait::async_trait;
use std::time::Instant;

use crate::client::{CompleteHandler, Middleware};
use crate::errors::SDKError;
use crate::types::{Request, Response};

/// Logs every model call through `tracing`.
#[derive(Clone, Debug, Default)]
pub struct TracingMiddleware;

#[async_trait]
impl Middleware for TracingMiddleware {
    async fn handle_complete(
        &self,
        request: Request,
        next: CompleteHandler,
    ) -> Result<Response, SDKError> {
        let provider = request.provider.clone().unwrap_or_default();
        let model = request.model.clone();
        let message_count = request.messages.len();
        let tool_count = request.tools.as_ref().map_or(0, Vec::len);
        let started = Instant::now();
        tracing::debug!(%provider, %model, message_count, tool_count, "model request");

        let result = next(request).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;
        match &result {
            Ok(response) => tracing::debug!(
                %provider,
                %model,
                elapsed_ms,
                finish_reason = %response.finish_reason.reason,
                total_tokens = response.usage.total_tokens,
                "model response"
            ),
            Err(error) => tracing::warn!(%provider, %model, elapsed_ms, %error, "model request failed"),
        }
        result
    }
}
