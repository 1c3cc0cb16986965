//! Tool handlers and the tool registry.
//!
//! Each Crawl4AI capability is exposed as one MCP tool. A handler owns the
//! tool's JSON schema and the translation between MCP arguments and the
//! backend's request/response shapes; the shared HTTP plumbing lives in
//! [`crate::backend::Crawl4aiClient`].
//!
//! Handlers are stateless: one instance per tool for the process lifetime,
//! safe to call concurrently. Failures never escape a handler — every error
//! is downgraded to a text result flagged with `isError`, so the transport
//! layer has no tool-specific error paths.

pub mod crawl;
pub mod execute_js;
pub mod html;
pub mod md;
pub mod pdf;
pub mod screenshot;

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use crate::backend::Crawl4aiClient;
use crate::error::RegistryError;

pub use crawl::CrawlTool;
pub use execute_js::ExecuteJsTool;
pub use html::HtmlTool;
pub use md::MarkdownTool;
pub use pdf::PdfTool;
pub use screenshot::ScreenshotTool;

/// A tool definition for the tools/list response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    /// Unique tool name.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// JSON Schema for the tool's input parameters.
    pub input_schema: Value,
}

/// Content item in a tool call response.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ToolContent {
    /// Text content.
    Text {
        /// The text content.
        text: String,
    },
}

#[allow(clippy::trivially_copy_pass_by_ref)] // serde's skip_serializing_if requires fn(&T) -> bool
const fn is_false(b: &bool) -> bool {
    !*b
}

/// Result of a tool call.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCallResult {
    /// Content returned by the tool.
    pub content: Vec<ToolContent>,
    /// Whether the tool call resulted in an error.
    #[serde(skip_serializing_if = "is_false")]
    pub is_error: bool,
}

impl ToolCallResult {
    /// Creates a successful text result.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text { text: text.into() }],
            is_error: false,
        }
    }

    /// Creates an error text result.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text {
                text: message.into(),
            }],
            is_error: true,
        }
    }
}

/// A single MCP tool: a static description plus an argument-to-content
/// translation backed by one Crawl4AI route.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// The tool's unique name.
    fn name(&self) -> &'static str;

    /// The tool's definition for tools/list.
    fn describe(&self) -> ToolDefinition;

    /// Executes the tool.
    ///
    /// Never fails at this boundary: argument problems and backend failures
    /// come back as error-flagged text results.
    async fn execute(&self, arguments: &Value) -> ToolCallResult;
}

/// Registry of available tools, in registration order.
#[derive(Default)]
pub struct ToolRegistry {
    handlers: Vec<Arc<dyn ToolHandler>>,
}

impl ToolRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler under its own name.
    ///
    /// Re-registering a name replaces the previous handler in place, keeping
    /// its position in the listing (last write wins).
    pub fn register(&mut self, handler: Arc<dyn ToolHandler>) {
        info!(tool = handler.name(), "registered tool");
        if let Some(slot) = self
            .handlers
            .iter_mut()
            .find(|h| h.name() == handler.name())
        {
            *slot = handler;
        } else {
            self.handlers.push(handler);
        }
    }

    /// Looks up a handler by name.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownTool`] naming the requested tool.
    pub fn get(&self, name: &str) -> Result<Arc<dyn ToolHandler>, RegistryError> {
        self.handlers
            .iter()
            .find(|h| h.name() == name)
            .cloned()
            .ok_or_else(|| RegistryError::UnknownTool {
                name: name.to_string(),
            })
    }

    /// Returns every tool definition in registration order.
    #[must_use]
    pub fn descriptors(&self) -> Vec<ToolDefinition> {
        self.handlers.iter().map(|h| h.describe()).collect()
    }

    /// Number of registered tools.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

/// Builds the registry with the full Crawl4AI tool set.
#[must_use]
pub fn default_registry(client: &Arc<Crawl4aiClient>) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(MarkdownTool::new(Arc::clone(client))));
    registry.register(Arc::new(HtmlTool::new(Arc::clone(client))));
    registry.register(Arc::new(ScreenshotTool::new(Arc::clone(client))));
    registry.register(Arc::new(PdfTool::new(Arc::clone(client))));
    registry.register(Arc::new(ExecuteJsTool::new(Arc::clone(client))));
    registry.register(Arc::new(CrawlTool::new(Arc::clone(client))));
    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct StubTool {
        name: &'static str,
        reply: &'static str,
    }

    #[async_trait]
    impl ToolHandler for StubTool {
        fn name(&self) -> &'static str {
            self.name
        }

        fn describe(&self) -> ToolDefinition {
            ToolDefinition {
                name: self.name.to_string(),
                description: self.reply.to_string(),
                input_schema: json!({"type": "object"}),
            }
        }

        async fn execute(&self, _arguments: &Value) -> ToolCallResult {
            ToolCallResult::text(self.reply)
        }
    }

    #[test]
    fn descriptors_preserve_registration_order() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(StubTool { name: "b", reply: "" }));
        registry.register(Arc::new(StubTool { name: "a", reply: "" }));
        registry.register(Arc::new(StubTool { name: "c", reply: "" }));

        let names: Vec<String> = registry.descriptors().into_iter().map(|d| d.name).collect();
        assert_eq!(names, vec!["b", "a", "c"]);
    }

    #[test]
    fn unknown_tool_is_an_error_naming_the_tool() {
        let registry = ToolRegistry::new();
        let err = registry.get("nonexistent").err().unwrap();
        assert!(err.to_string().contains("nonexistent"));
    }

    #[test]
    fn duplicate_registration_is_last_write_wins() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(StubTool {
            name: "dup",
            reply: "first",
        }));
        registry.register(Arc::new(StubTool {
            name: "other",
            reply: "",
        }));
        registry.register(Arc::new(StubTool {
            name: "dup",
            reply: "second",
        }));

        // Only the second handler is retrievable, and the position is stable.
        assert_eq!(registry.len(), 2);
        let names: Vec<String> = registry.descriptors().into_iter().map(|d| d.name).collect();
        assert_eq!(names, vec!["dup", "other"]);

        let result = tokio_test::block_on(registry.get("dup").unwrap().execute(&json!({})));
        let ToolContent::Text { text } = &result.content[0];
        assert_eq!(text, "second");
    }

    #[test]
    fn error_result_sets_the_flag() {
        let result = ToolCallResult::error("Error something broke");
        assert!(result.is_error);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["isError"], json!(true));
    }

    #[test]
    fn success_result_omits_the_flag() {
        let result = ToolCallResult::text("ok");
        let json = serde_json::to_value(&result).unwrap();
        assert!(json.get("isError").is_none());
    }
}
