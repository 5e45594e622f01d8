//! Outstanding-request bookkeeping for the requesting side of a connection.
//!
//! Every request gets a fresh id and a one-shot completion slot. A slot is
//! resolved at most once: by the matching response, by [`CorrelationTable::close`],
//! or never, after the caller gave up and [`CorrelationTable::forget`] removed it.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Instant;

use serde_json::Value;
use tokio::sync::{oneshot, Mutex};

use crate::types::{JsonRpcResponse, McpError, McpResult, RequestId, ResponseOutcome};

pub type Completion = oneshot::Receiver<McpResult<Value>>;

struct PendingRequest {
    method: String,
    issued_at: Instant,
    slot: oneshot::Sender<McpResult<Value>>,
}

#[derive(Default)]
struct Inner {
    pending: HashMap<RequestId, PendingRequest>,
    closed: bool,
}

pub struct CorrelationTable {
    next_id: AtomicI64,
    inner: Mutex<Inner>,
}

impl Default for CorrelationTable {
    fn default() -> Self {
        Self::new()
    }
}

impl CorrelationTable {
    pub fn new() -> Self {
        Self {
            next_id: AtomicI64::new(1),
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Allocate an id for `method` and park a completion slot under it.
    pub async fn register(&self, method: &str) -> McpResult<(RequestId, Completion)> {
        let mut inner = self.inner.lock().await;
        if inner.closed {
            return Err(McpError::ConnectionClosed);
        }

        let id = loop {
            let candidate = RequestId::Number(self.next_id.fetch_add(1, Ordering::Relaxed));
            if !inner.pending.contains_key(&candidate) {
                break candidate;
            }
        };

        let (slot, completion) = oneshot::channel();
        inner.pending.insert(
            id.clone(),
            PendingRequest {
                method: method.to_string(),
                issued_at: Instant::now(),
                slot,
            },
        );
        Ok((id, completion))
    }

    /// Resolve the entry matching `response.id`. Returns `false` when no such
    /// entry exists (late, duplicate, or unsolicited response).
    pub async fn complete(&self, response: JsonRpcResponse) -> bool {
        let mut inner = self.inner.lock().await;
        let Some(entry) = inner.pending.remove(&response.id) else {
            tracing::debug!("Ignoring response for unknown request id {}", response.id);
            return false;
        };

        tracing::trace!(
            "Request {} ({}) completed in {:?}",
            response.id,
            entry.method,
            entry.issued_at.elapsed()
        );
        let outcome = match response.outcome {
            ResponseOutcome::Result(value) => Ok(value),
            ResponseOutcome::Error(error) => Err(McpError::from_error_object(error)),
        };
        // The waiter may already be gone (cancelled future); nothing to do then.
        let _ = entry.slot.send(outcome);
        true
    }

    /// Drop an entry without resolving it. Returns `false` if it had already
    /// been completed or removed.
    pub async fn forget(&self, id: &RequestId) -> bool {
        self.inner.lock().await.pending.remove(id).is_some()
    }

    /// Fail every outstanding entry with `ConnectionClosed` and refuse new ones.
    pub async fn close(&self) -> usize {
        let mut inner = self.inner.lock().await;
        inner.closed = true;
        let drained: Vec<_> = inner.pending.drain().collect();
        let count = drained.len();
        for (id, entry) in drained {
            tracing::debug!("Failing request {id} ({}): connection closed", entry.method);
            let _ = entry.slot.send(Err(McpError::ConnectionClosed));
        }
        count
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.pending.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.lock().await.pending.is_empty()
    }

    pub async fn is_closed(&self) -> bool {
        self.inner.lock().await.closed
    }
}
