//! The `screenshot` tool: full-page PNG capture.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{ToolCallResult, ToolDefinition, ToolHandler};
use crate::backend::Crawl4aiClient;

/// Captures a full-page screenshot with a configurable pre-capture delay.
///
/// This tool never writes files itself; an `output_path` is forwarded to the
/// backend, which decides whether to honour it.
pub struct ScreenshotTool {
    client: Arc<Crawl4aiClient>,
}

#[derive(Debug, Deserialize)]
struct ScreenshotArgs {
    url: String,
    #[serde(default)]
    output_path: Option<String>,
    #[serde(default = "default_wait")]
    screenshot_wait_for: f64,
}

const fn default_wait() -> f64 {
    2.0
}

impl ScreenshotTool {
    /// Creates the tool with a shared backend client.
    #[must_use]
    pub fn new(client: Arc<Crawl4aiClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ToolHandler for ScreenshotTool {
    fn name(&self) -> &'static str {
        "screenshot"
    }

    fn describe(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description:
                "Capture full-page PNG screenshot of specified URL with configurable wait time"
                    .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "url": {
                        "type": "string",
                        "description": "Target URL to capture screenshot from"
                    },
                    "output_path": {
                        "type": "string",
                        "description": "Optional path to save screenshot file (if not provided, returns base64 data)"
                    },
                    "screenshot_wait_for": {
                        "type": "number",
                        "default": 2,
                        "description": "Wait time in seconds before capturing screenshot"
                    }
                },
                "required": ["url"]
            }),
        }
    }

    async fn execute(&self, arguments: &Value) -> ToolCallResult {
        let args: ScreenshotArgs = match serde_json::from_value(arguments.clone()) {
            Ok(args) => args,
            Err(e) => return ToolCallResult::error(format!("Error capturing screenshot: {e}")),
        };

        let mut request = json!({
            "url": args.url,
            "screenshot_wait_for": args.screenshot_wait_for,
        });
        if let Some(path) = args.output_path {
            request["output_path"] = Value::String(path);
        }

        match self.client.call("screenshot", &request).await {
            Ok(result) => ToolCallResult::text(describe_capture(&result)),
            Err(e) => ToolCallResult::error(format!("Error capturing screenshot: {e}")),
        }
    }
}

/// Summarises the backend's screenshot response.
fn describe_capture(result: &Value) -> String {
    let Some(obj) = result.as_object() else {
        return result.to_string();
    };

    if let Some(path) = obj.get("screenshot_path").and_then(Value::as_str) {
        return format!("Screenshot saved to: {path}");
    }
    if let Some(data) = obj.get("screenshot").and_then(Value::as_str) {
        return format!("Screenshot captured (base64 data: {} chars)", data.len());
    }
    result.to_string()
}
