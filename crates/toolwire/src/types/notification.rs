//! MCP notification types.

use serde::{Deserialize, Serialize};

use super::message::RequestId;

/// Sent by the client once it has processed the `initialize` response.
pub const INITIALIZED: &str = "notifications/initialized";

/// Sent by either side to abandon an in-flight request.
pub const CANCELLED: &str = "notifications/cancelled";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelledParams {
    pub request_id: RequestId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}
