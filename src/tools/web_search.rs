//! Web search tool backed by the Tavily search API.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use super::arguments::ToolArguments;
use super::tool::{AgentTool, ToolExecutionContext};
use super::types::ToolParameters;
use crate::error::CounselError;
use crate::provider::http::{shared_client, status_to_error};

/// Name the model uses to call the search tool.
pub const WEB_SEARCH_TOOL_NAME: &str = "web_search";

const DEFAULT_TAVILY_BASE_URL: &str = "https://api.tavily.com";

/// One search hit as returned to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    api_key: &'a str,
    query: &'a str,
    max_results: u32,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchHit>,
}

/// Thin client for `POST {base}/search`.
#[derive(Debug, Clone)]
pub struct TavilyClient {
    api_key: String,
    base_url: String,
}

impl TavilyClient {
    pub fn new(api_key: impl Into<String>, base_url: Option<String>) -> Self {
        let base_url = base_url.unwrap_or_else(|| DEFAULT_TAVILY_BASE_URL.to_string());
        Self {
            api_key: api_key.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Run a search. Canceling `cancel` aborts the in-flight request.
    pub async fn search(
        &self,
        query: &str,
        max_results: u32,
        cancel: &CancellationToken,
    ) -> Result<Vec<SearchHit>, CounselError> {
        let url = format!("{}/search", self.base_url);
        let body = SearchRequest {
            api_key: &self.api_key,
            query,
            max_results,
        };
        tracing::debug!(query, max_results, "web search request");

        let request = async {
            let response = shared_client().post(&url).json(&body).send().await?;
            let status = response.status();
            if !status.is_success() {
                let text = response.text().await.unwrap_or_default();
                return Err(status_to_error(status.as_u16(), &text));
            }
            let parsed: SearchResponse = response.json().await?;
            Ok(parsed.results)
        };

        tokio::select! {
            _ = cancel.cancelled() => Err(CounselError::Canceled),
            result = request => result,
        }
    }
}

/// Build the `web_search` tool.
///
/// The tool output is a JSON array of `{url, title, content}` objects.
pub fn web_search_tool(client: TavilyClient, max_results: u32) -> AgentTool {
    let client = Arc::new(client);
    let parameters = ToolParameters::object()
        .string(
            "query",
            "What to search the web for, phrased as a search engine query",
            true,
        )
        .build();

    AgentTool::new(
        WEB_SEARCH_TOOL_NAME,
        "Search the web for current market data, competitors, regulations or pricing.",
        parameters,
        move |args: ToolArguments, ctx: ToolExecutionContext| {
            let client = Arc::clone(&client);
            async move {
                let query = args.get_str("query")?.to_string();
                let hits = client.search(&query, max_results, &ctx.cancel).await?;
                Ok(serde_json::to_value(hits)?)
            }
        },
    )
}

/// Extract result URLs from a `web_search` tool output.
///
/// Anything that is not an array of hits yields no URLs.
pub fn result_urls(content: &str) -> Vec<String> {
    serde_json::from_str::<Vec<SearchHit>>(content)
        .map(|hits| hits.into_iter().map(|hit| hit.url).collect())
        .unwrap_or_default()
}
