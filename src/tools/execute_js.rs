//! The `execute_js` tool: JavaScript execution on a page.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use super::{ToolCallResult, ToolDefinition, ToolHandler};
use crate::backend::Crawl4aiClient;

/// Executes JavaScript snippets on a URL and returns the crawl result.
pub struct ExecuteJsTool {
    client: Arc<Crawl4aiClient>,
}

#[derive(Debug, Deserialize)]
struct ExecuteJsArgs {
    url: String,
    scripts: Vec<String>,
}

impl ExecuteJsTool {
    /// Creates the tool with a shared backend client.
    #[must_use]
    pub fn new(client: Arc<Crawl4aiClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ToolHandler for ExecuteJsTool {
    fn name(&self) -> &'static str {
        "execute_js"
    }

    fn describe(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: "Execute JavaScript code on specified URL and return comprehensive results"
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "url": {
                        "type": "string",
                        "description": "Target URL to execute JavaScript on"
                    },
                    "scripts": {
                        "type": "array",
                        "items": {"type": "string"},
                        "description": "List of JavaScript snippets to execute in order (each should be an expression that returns a value)"
                    }
                },
                "required": ["url", "scripts"]
            }),
        }
    }

    async fn execute(&self, arguments: &Value) -> ToolCallResult {
        let args: ExecuteJsArgs = match serde_json::from_value(arguments.clone()) {
            Ok(args) => args,
            Err(e) => return ToolCallResult::error(format!("Error executing JavaScript: {e}")),
        };

        let request = json!({
            "url": args.url,
            "scripts": args.scripts,
        });

        match self.client.call("execute_js", &request).await {
            Ok(result) => ToolCallResult::text(compose_result(&result)),
            Err(e) => ToolCallResult::error(format!("Error executing JavaScript: {e}")),
        }
    }
}

/// Composes the interesting subset of a crawl result into formatted JSON.
///
/// Surfaces url, success flag, script result, extracted content, links and
/// media; markdown is included only when the backend produced it.
fn compose_result(result: &Value) -> String {
    let Some(obj) = result.as_object() else {
        return result.to_string();
    };

    let mut formatted = Map::new();
    formatted.insert("url".to_string(), obj.get("url").cloned().unwrap_or(Value::Null));
    formatted.insert(
        "success".to_string(),
        obj.get("success").cloned().unwrap_or(Value::Bool(false)),
    );
    formatted.insert(
        "js_execution_result".to_string(),
        obj.get("js_execution_result").cloned().unwrap_or(Value::Null),
    );
    formatted.insert(
        "extracted_content".to_string(),
        obj.get("extracted_content").cloned().unwrap_or(Value::Null),
    );
    formatted.insert(
        "links".to_string(),
        obj.get("links").cloned().unwrap_or_else(|| json!({})),
    );
    formatted.insert(
        "media".to_string(),
        obj.get("media").cloned().unwrap_or_else(|| json!({})),
    );
    if let Some(markdown) = obj.get("markdown") {
        formatted.insert("markdown".to_string(), markdown.clone());
    }

    let formatted = Value::Object(formatted);
    serde_json::to_string_pretty(&formatted).unwrap_or_else(|_| formatted.to_string())
}
