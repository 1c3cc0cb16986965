//! The `crawl` tool: bulk crawling of up to 100 URLs.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{ToolCallResult, ToolDefinition, ToolHandler};
use crate::backend::Crawl4aiClient;

/// Upper bound on URLs per call, mirrored in the schema's `maxItems`.
///
/// Re-checked here because not every transport guarantees schema
/// enforcement before the call reaches the handler.
const MAX_URLS: usize = 100;

/// Crawls multiple URLs in one backend call and returns results as JSON.
pub struct CrawlTool {
    client: Arc<Crawl4aiClient>,
}

#[derive(Debug, Deserialize)]
struct CrawlArgs {
    urls: Vec<String>,
    #[serde(default)]
    browser_config: Option<Value>,
    #[serde(default)]
    crawler_config: Option<Value>,
}

impl CrawlTool {
    /// Creates the tool with a shared backend client.
    #[must_use]
    pub fn new(client: Arc<Crawl4aiClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ToolHandler for CrawlTool {
    fn name(&self) -> &'static str {
        "crawl"
    }

    fn describe(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: "Crawl multiple URLs simultaneously and return comprehensive results for each"
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "urls": {
                        "type": "array",
                        "items": {"type": "string"},
                        "maxItems": MAX_URLS,
                        "minItems": 1,
                        "description": "List of URLs to crawl (maximum 100 URLs)"
                    },
                    "browser_config": {
                        "type": "object",
                        "description": "Browser configuration options (optional)",
                        "additionalProperties": true
                    },
                    "crawler_config": {
                        "type": "object",
                        "description": "Crawler configuration options (optional)",
                        "additionalProperties": true
                    }
                },
                "required": ["urls"]
            }),
        }
    }

    async fn execute(&self, arguments: &Value) -> ToolCallResult {
        let args: CrawlArgs = match serde_json::from_value(arguments.clone()) {
            Ok(args) => args,
            Err(e) => return ToolCallResult::error(format!("Error crawling URLs: {e}")),
        };

        if args.urls.is_empty() {
            return ToolCallResult::error("Error crawling URLs: at least one URL is required");
        }
        if args.urls.len() > MAX_URLS {
            return ToolCallResult::error(format!(
                "Error crawling URLs: {} URLs provided, maximum is {MAX_URLS}",
                args.urls.len()
            ));
        }

        let mut request = json!({ "urls": args.urls });
        if let Some(browser_config) = args.browser_config {
            request["browser_config"] = browser_config;
        }
        if let Some(crawler_config) = args.crawler_config {
            request["crawler_config"] = crawler_config;
        }

        match self.client.call("crawl", &request).await {
            Ok(result) => ToolCallResult::text(format_results(&result)),
            Err(e) => ToolCallResult::error(format!("Error crawling URLs: {e}")),
        }
    }
}

/// Pretty-prints the crawl response, prefixed with a per-URL count summary
/// when the response shape yields one.
fn format_results(result: &Value) -> String {
    let pretty = serde_json::to_string_pretty(result).unwrap_or_else(|_| result.to_string());

    let count = match result {
        Value::Array(items) => Some(items.len()),
        Value::Object(obj) => obj
            .get("results")
            .and_then(Value::as_array)
            .map(Vec::len),
        _ => None,
    };

    match count {
        Some(n) => format!("Crawled {n} URLs successfully.\n\n{pretty}"),
        None => pretty,
    }
}
