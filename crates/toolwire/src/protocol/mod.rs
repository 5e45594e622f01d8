//! MCP protocol handling: codec, method routing, negotiation, dispatch.

pub mod codec;
pub mod handler;
pub mod methods;
pub mod negotiation;

pub use codec::{salvage_id, Codec};
pub use handler::ProtocolHandler;
pub use methods::BuiltinMethod;
pub use negotiation::NegotiatedCapabilities;
