//! The `md` tool: webpage to markdown conversion.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{ToolCallResult, ToolDefinition, ToolHandler};
use crate::backend::Crawl4aiClient;

/// Converts webpage content to clean markdown with content filtering.
pub struct MarkdownTool {
    client: Arc<Crawl4aiClient>,
}

/// Arguments for the `md` tool.
///
/// The filter arguments (`c`, `f`, `q`, `provider`) are accepted by the
/// schema but not forwarded to the backend: the generic crawl route ignores
/// them. TODO: forward the filter strategy and query once the backend's
/// dedicated /md route is exposed.
#[derive(Debug, Deserialize)]
struct MdArgs {
    url: String,
}

impl MarkdownTool {
    /// Creates the tool with a shared backend client.
    #[must_use]
    pub fn new(client: Arc<Crawl4aiClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ToolHandler for MarkdownTool {
    fn name(&self) -> &'static str {
        "md"
    }

    fn describe(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: "Convert webpage to clean markdown format with content filtering options"
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "url": {
                        "type": "string",
                        "description": "Target URL to crawl and convert to markdown"
                    },
                    "c": {
                        "type": "string",
                        "default": "0",
                        "description": "Cache-bust counter for forcing fresh content"
                    },
                    "f": {
                        "type": "string",
                        "default": "fit",
                        "enum": ["raw", "fit", "bm25", "llm"],
                        "description": "Content filter strategy: raw, fit, bm25, or llm"
                    },
                    "q": {
                        "type": "string",
                        "description": "Query string for BM25/LLM content filtering"
                    },
                    "provider": {
                        "type": "string",
                        "description": "LLM provider override (e.g., 'anthropic/claude-3-opus')"
                    }
                },
                "required": ["url"]
            }),
        }
    }

    async fn execute(&self, arguments: &Value) -> ToolCallResult {
        let args: MdArgs = match serde_json::from_value(arguments.clone()) {
            Ok(args) => args,
            Err(e) => return ToolCallResult::error(format!("Error converting to markdown: {e}")),
        };

        // The backend's crawl route takes an array of URLs.
        let request = json!({
            "urls": [args.url],
            "wait_for": "body",
            "timeout": 30000,
            "remove_overlay_elements": true,
            "magic": true,
            "exclude_external_links": true,
        });

        match self.client.call("crawl", &request).await {
            Ok(result) => ToolCallResult::text(extract_markdown(&result)),
            Err(e) => ToolCallResult::error(format!("Error converting to markdown: {e}")),
        }
    }
}

/// Pulls markdown out of a crawl response.
///
/// Preference order for the first per-URL result: `markdown`, then
/// `markdown_v2.raw_markdown`, then the stringified result. An object-shaped
/// response with a top-level `markdown` field is also accepted.
fn extract_markdown(result: &Value) -> String {
    if let Some(first) = result.as_array().and_then(|a| a.first()) {
        let Some(obj) = first.as_object() else {
            return result.to_string();
        };

        if let Some(md) = obj.get("markdown").and_then(Value::as_str) {
            if !md.is_empty() {
                return md.to_string();
            }
        }
        if let Some(v2) = obj.get("markdown_v2") {
            if let Some(raw) = v2.get("raw_markdown").and_then(Value::as_str) {
                return raw.to_string();
            }
            return first.to_string();
        }
        return first.to_string();
    }

    if let Some(md) = result.get("markdown").and_then(Value::as_str) {
        return md.to_string();
    }
    result.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_top_level_markdown() {
        let response = json!([{"markdown": "# Hi"}]);
        assert_eq!(extract_markdown(&response), "# Hi");
    }

    #[test]
    fn falls_back_to_markdown_v2() {
        let response = json!([{"markdown_v2": {"raw_markdown": "# Fallback"}}]);
        assert_eq!(extract_markdown(&response), "# Fallback");
    }

    #[test]
    fn empty_markdown_still_falls_back() {
        let response = json!([{"markdown": "", "markdown_v2": {"raw_markdown": "# V2"}}]);
        assert_eq!(extract_markdown(&response), "# V2");
    }

    #[test]
    fn object_response_with_markdown_field() {
        let response = json!({"markdown": "# Object"});
        assert_eq!(extract_markdown(&response), "# Object");
    }

    #[test]
    fn unrecognised_shape_is_stringified() {
        let response = json!([{"html": "<p>no markdown here</p>"}]);
        assert!(extract_markdown(&response).contains("no markdown here"));
    }
}
