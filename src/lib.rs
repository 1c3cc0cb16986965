//! crawl4ai-mcp: MCP server for the Crawl4AI web-crawling backend
//!
//! This library is a protocol translation proxy: it speaks MCP to AI
//! assistants and plain HTTP/JSON to a remote Crawl4AI instance. All actual
//! crawling (rendering, extraction, screenshots, PDF generation) happens in
//! the backend; this crate contributes the tool catalogue, request shaping,
//! and the transport/session layer.
//!
//! # Transports
//!
//! - **stdio** for command-line MCP clients
//! - **SSE** for web clients (event stream + companion message endpoint)
//! - **streamable HTTP** with event-store-backed resumability
//!
//! # Modules
//!
//! - [`backend`] — HTTP client for the Crawl4AI API
//! - [`config`] — Environment/CLI configuration resolution
//! - [`error`] — Error types
//! - [`mcp`] — MCP protocol, transports and session management
//! - [`tools`] — Tool handlers and the tool registry

pub mod backend;
pub mod config;
pub mod error;
pub mod mcp;
pub mod tools;
