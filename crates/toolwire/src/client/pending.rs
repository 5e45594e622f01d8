use std::sync::Arc;

use serde_json::Value;

use crate::correlation::Completion;
use crate::types::{McpError, McpResult, RequestId};

use super::ClientInner;

/// An issued request whose response has not been consumed yet.
///
/// Dropping it without `wait` or `cancel` releases its correlation slot; a
/// response that arrives afterwards is discarded as unsolicited.
pub struct PendingCall {
    inner: Arc<ClientInner>,
    id: RequestId,
    method: String,
    completion: Completion,
    settled: bool,
}

impl PendingCall {
    pub(super) fn new(
        inner: Arc<ClientInner>,
        id: RequestId,
        method: String,
        completion: Completion,
    ) -> Self {
        Self {
            inner,
            id,
            method,
            completion,
            settled: false,
        }
    }

    pub fn id(&self) -> &RequestId {
        &self.id
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    /// Wait for the response under the configured request timeout.
    pub async fn wait(mut self) -> McpResult<Value> {
        let timeout = self.inner.config.request_timeout;
        let outcome = tokio::time::timeout(timeout, &mut self.completion).await;
        self.settled = true;
        match outcome {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(McpError::ConnectionClosed),
            Err(_) => {
                if self.inner.table.forget(&self.id).await {
                    tracing::warn!("Request {} ({}) timed out", self.id, self.method);
                    return Err(McpError::RequestTimedOut {
                        method: std::mem::take(&mut self.method),
                        timeout_ms: timeout.as_millis() as u64,
                    });
                }
                // Lost the race: the slot was filled before it could be removed.
                match self.completion.try_recv() {
                    Ok(result) => result,
                    Err(_) => Err(McpError::ConnectionClosed),
                }
            }
        }
    }

    /// Abandon the request and tell the server. Returns `false` if the
    /// response had already arrived.
    pub async fn cancel(mut self, reason: Option<&str>) -> McpResult<bool> {
        self.settled = true;
        self.inner.cancel(&self.id, reason).await
    }
}

impl Drop for PendingCall {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        // Outside a runtime there is nothing to run the cleanup on.
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            return;
        };
        let inner = self.inner.clone();
        let id = self.id.clone();
        runtime.spawn(async move {
            if inner.table.forget(&id).await {
                tracing::debug!("Request {id} dropped before its response");
            }
        });
    }
}
