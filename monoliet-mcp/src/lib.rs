//! Monoliet MCP Server Library
//!
//! This crate exposes the n8n workflow tools to AI agents over the Model
//! Context Protocol, either as newline-delimited JSON-RPC on stdio or as a
//! small HTTP API, and bootstraps the management API next to it.
//!
//! ## Architecture
//!
//! ```text
//! Agent (Claude, GPT, etc.)          Operator portal
//!        │                                  │
//!        ▼                                  ▼
//! ┌─────────────────┐             ┌──────────────────┐
//! │   MCP Server    │ ◄── here    │  monoliet-server │
//! │ stdio │ HTTP    │             │  management API  │
//! └────────┬────────┘             └────────┬─────────┘
//!          │  ToolRegistry::call           │
//!          ▼                               ▼
//! ┌───────────────────────────────────────────────────┐
//! │                  monoliet-core                    │
//! │   eleven tools  ·  Envelope  ·  N8nClient         │
//! └───────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use monoliet_mcp::McpServer;
//!
//! let tools = ToolRegistry::with_default_tools(client);
//! McpServer::new(tools).run_stdio(shutdown).await?;
//! ```

pub mod check;
pub mod error;
pub mod http;
pub mod server;

pub use error::{McpError, McpResult};
pub use http::HttpServer;
pub use server::McpServer;

/// Server metadata for MCP protocol
pub const SERVER_NAME: &str = "monoliet-n8n-mcp";
pub const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");
pub const SERVER_INSTRUCTIONS: &str =
    "Tools for managing n8n workflows: list, inspect, create, update, activate, deactivate, delete, search and execute workflows, and review execution history and workflow health.";
