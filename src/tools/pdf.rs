//! The `pdf` tool: webpage to PDF rendering.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{ToolCallResult, ToolDefinition, ToolHandler};
use crate::backend::Crawl4aiClient;

/// Generates a PDF document of a webpage for archival or printing.
pub struct PdfTool {
    client: Arc<Crawl4aiClient>,
}

#[derive(Debug, Deserialize)]
struct PdfArgs {
    url: String,
    #[serde(default)]
    output_path: Option<String>,
}

impl PdfTool {
    /// Creates the tool with a shared backend client.
    #[must_use]
    pub fn new(client: Arc<Crawl4aiClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ToolHandler for PdfTool {
    fn name(&self) -> &'static str {
        "pdf"
    }

    fn describe(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: "Generate PDF document from webpage for archival or printing purposes"
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "url": {
                        "type": "string",
                        "description": "Target URL to convert to PDF document"
                    },
                    "output_path": {
                        "type": "string",
                        "description": "Optional path to save PDF file (if not provided, returns base64 data)"
                    }
                },
                "required": ["url"]
            }),
        }
    }

    async fn execute(&self, arguments: &Value) -> ToolCallResult {
        let args: PdfArgs = match serde_json::from_value(arguments.clone()) {
            Ok(args) => args,
            Err(e) => return ToolCallResult::error(format!("Error generating PDF: {e}")),
        };

        let mut request = json!({ "url": args.url });
        if let Some(path) = args.output_path {
            request["output_path"] = Value::String(path);
        }

        match self.client.call("pdf", &request).await {
            Ok(result) => ToolCallResult::text(describe_pdf(&result)),
            Err(e) => ToolCallResult::error(format!("Error generating PDF: {e}")),
        }
    }
}

/// Summarises the backend's PDF response.
fn describe_pdf(result: &Value) -> String {
    let Some(obj) = result.as_object() else {
        return result.to_string();
    };

    if let Some(path) = obj.get("pdf_path").and_then(Value::as_str) {
        return format!("PDF saved to: {path}");
    }
    if let Some(data) = obj.get("pdf").and_then(Value::as_str) {
        return format!("PDF generated (base64 data: {} chars)", data.len());
    }
    result.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_saved_path() {
        let response = json!({"pdf_path": "/tmp/page.pdf"});
        assert_eq!(describe_pdf(&response), "PDF saved to: /tmp/page.pdf");
    }

    #[test]
    fn reports_base64_length() {
        let response = json!({"pdf": "JVBERi0x"});
        assert_eq!(describe_pdf(&response), "PDF generated (base64 data: 8 chars)");
    }

    #[test]
    fn unrecognised_shape_is_stringified() {
        let response = json!(["unexpected"]);
        assert!(describe_pdf(&response).contains("unexpected"));
    }
}
