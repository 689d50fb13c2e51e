//! MCP stdio server for vvmcp.
//!
//! Speaks line-delimited JSON-RPC 2.0 and exposes three tools
//! (`get_speakers`, `speak`, `stop_speaking`) backed by any
//! `vvmcp_core::SpeechPort`.
#![deny(unused_crate_dependencies)]

// async-trait is only needed by the fake ports in tests
#[cfg(test)]
use async_trait as _;

pub mod protocol;
pub mod server;
pub mod tools;

pub use protocol::{JsonRpcError, JsonRpcRequest, JsonRpcResponse, PROTOCOL_VERSION};
pub use server::{McpServer, McpServerError, SERVER_NAME, serve_stdio};
pub use tools::{ToolCallResult, ToolContent, ToolDescriptor, tool_descriptors};
