//! Trac XML-RPC source adapter

pub mod client;
pub mod codec;
pub mod transport;
pub mod value;

pub use client::{AttachmentParent, PluginVersion, TracClient};
pub use transport::{RpcTransport, XmlRpcTransport};
pub use value::RpcValue;
