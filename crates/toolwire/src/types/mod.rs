//! All MCP data types shared by client and server.

pub mod capabilities;
pub mod error;
pub mod message;
pub mod notification;
pub mod request;
pub mod response;

pub use capabilities::*;
pub use error::*;
pub use message::*;
pub use notification::CancelledParams;
pub use request::*;
pub use response::*;
