//! Handshake state machine shared by client and server sessions.

use crate::types::{McpError, McpResult};

/// Lifecycle of one connection. Nothing leaves `Closed`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SessionState {
    #[default]
    Unestablished,
    Negotiating,
    Active,
    Closed,
}

impl SessionState {
    /// `Unestablished → Negotiating`, on sending or receiving `initialize`.
    pub fn begin_negotiation(&mut self) -> McpResult<()> {
        match self {
            SessionState::Unestablished => {
                *self = SessionState::Negotiating;
                Ok(())
            }
            SessionState::Negotiating => Err(McpError::InvalidRequest(
                "handshake already in progress".to_string(),
            )),
            SessionState::Active => Err(McpError::InvalidRequest(
                "session is already initialized".to_string(),
            )),
            SessionState::Closed => Err(McpError::ConnectionClosed),
        }
    }

    /// `Negotiating → Active`, once the handshake response has been validated.
    pub fn activate(&mut self) -> McpResult<()> {
        match self {
            SessionState::Negotiating => {
                *self = SessionState::Active;
                Ok(())
            }
            SessionState::Closed => Err(McpError::ConnectionClosed),
            other => Err(McpError::InternalError(format!(
                "cannot activate a session in state {other:?}"
            ))),
        }
    }

    /// Any state → `Closed`. Returns `false` if it was already closed.
    pub fn close(&mut self) -> bool {
        let was_open = *self != SessionState::Closed;
        *self = SessionState::Closed;
        was_open
    }

    /// Gate for every request other than the handshake.
    pub fn require_active(&self, method: &str) -> McpResult<()> {
        match self {
            SessionState::Active => Ok(()),
            SessionState::Closed => Err(McpError::ConnectionClosed),
            SessionState::Unestablished | SessionState::Negotiating => {
                Err(McpError::NotInitialized(method.to_string()))
            }
        }
    }

    pub fn is_active(&self) -> bool {
        *self == SessionState::Active
    }

    pub fn is_closed(&self) -> bool {
        *self == SessionState::Closed
    }
}
