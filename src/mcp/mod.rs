//! Model Context Protocol (MCP) server implementation.
//!
//! This module implements the MCP specification for exposing Crawl4AI
//! operations as tools to AI assistants, over three transports sharing one
//! dispatch path.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                          MCP Server                          │
//! │                                                              │
//! │  ┌────────────┐  ┌────────────┐                              │
//! │  │   stdio    │─▶│            │   ┌──────────┐  ┌─────────┐  │
//! │  │    SSE     │─▶│ McpSession │──▶│ Registry │─▶│ Backend │  │
//! │  │ streamable │─▶│ (lifecycle)│   │ (tools)  │  │ client  │  │
//! │  └────────────┘  └────────────┘   └──────────┘  └─────────┘  │
//! │        │                                                     │
//! │        ▼                                                     │
//! │  ┌────────────┐   streamable HTTP only: outbound messages    │
//! │  │ EventStore │   are logged per session for replay after    │
//! │  └────────────┘   client reconnect (Last-Event-ID)           │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Protocol Version
//!
//! This implementation targets MCP protocol version 2024-11-05.

pub mod event_store;
pub mod http;
pub mod protocol;
pub mod server;
pub mod transport;

pub use event_store::EventStore;
pub use protocol::{JsonRpcError, JsonRpcRequest, JsonRpcResponse, MCP_PROTOCOL_VERSION};
pub use server::{McpServer, McpSession};
pub use transport::StdioTransport;
