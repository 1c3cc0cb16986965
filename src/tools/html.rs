//! The `html` tool: preprocessed HTML extraction.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{ToolCallResult, ToolDefinition, ToolHandler};
use crate::backend::Crawl4aiClient;

/// Returns cleaned, preprocessed HTML for schema extraction workflows.
pub struct HtmlTool {
    client: Arc<Crawl4aiClient>,
}

#[derive(Debug, Deserialize)]
struct HtmlArgs {
    url: String,
}

impl HtmlTool {
    /// Creates the tool with a shared backend client.
    #[must_use]
    pub fn new(client: Arc<Crawl4aiClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ToolHandler for HtmlTool {
    fn name(&self) -> &'static str {
        "html"
    }

    fn describe(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: "Get cleaned and preprocessed HTML content for further processing"
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "url": {
                        "type": "string",
                        "description": "Target URL to crawl and extract HTML from"
                    }
                },
                "required": ["url"]
            }),
        }
    }

    async fn execute(&self, arguments: &Value) -> ToolCallResult {
        let args: HtmlArgs = match serde_json::from_value(arguments.clone()) {
            Ok(args) => args,
            Err(e) => return ToolCallResult::error(format!("Error extracting HTML: {e}")),
        };

        let request = json!({
            "urls": [args.url],
            "wait_for": "body",
            "timeout": 30000,
            "remove_overlay_elements": true,
        });

        match self.client.call("crawl", &request).await {
            Ok(result) => ToolCallResult::text(extract_html(&result)),
            Err(e) => ToolCallResult::error(format!("Error extracting HTML: {e}")),
        }
    }
}

/// Pulls HTML out of a crawl response: `html`, then `cleaned_html`, then the
/// stringified result.
fn extract_html(result: &Value) -> String {
    if let Some(first) = result.as_array().and_then(|a| a.first()) {
        let Some(obj) = first.as_object() else {
            return result.to_string();
        };

        if let Some(html) = obj.get("html").and_then(Value::as_str) {
            return html.to_string();
        }
        if let Some(cleaned) = obj.get("cleaned_html").and_then(Value::as_str) {
            return cleaned.to_string();
        }
        return first.to_string();
    }

    if let Some(html) = result.get("html").and_then(Value::as_str) {
        return html.to_string();
    }
    result.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefers_html_field() {
        let response = json!([{"html": "<h1>Test</h1>", "cleaned_html": "<h1>Clean</h1>"}]);
        assert_eq!(extract_html(&response), "<h1>Test</h1>");
    }

    #[test]
    fn falls_back_to_cleaned_html() {
        let response = json!([{"cleaned_html": "<h1>Clean</h1>"}]);
        assert_eq!(extract_html(&response), "<h1>Clean</h1>");
    }

    #[test]
    fn object_response_with_html_field() {
        let response = json!({"html": "<p>flat</p>"});
        assert_eq!(extract_html(&response), "<p>flat</p>");
    }

    #[test]
    fn unrecognised_shape_is_stringified() {
        let response = json!([{"status": "no html"}]);
        assert!(extract_html(&response).contains("no html"));
    }
}
