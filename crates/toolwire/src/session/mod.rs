//! Per-connection sessions.

pub mod server;
pub mod state;

pub use server::ServerSession;
pub use state::SessionState;
