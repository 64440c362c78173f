//! Registry of named tools and their invocation policy.
//!
//! Every call gets exactly one [`ToolResult`]. Failures of any kind (unknown
//! tool, invalid arguments, tool error, timeout, cancellation) become a
//! `success = false` result rather than an error of the turn.

use std::sync::Arc;
use std::time::Duration;

use futures::future;
use tokio_util::sync::CancellationToken;

use super::arguments::ToolArguments;
use super::tool::{Tool, ToolExecutionContext};
use super::validation::validate_arguments;
use crate::provider::ToolDefinition;
use crate::types::{ToolCallRequest, ToolResult};
use crate::util::timeout::with_timeout;

const DEFAULT_TOOL_TIMEOUT: Duration = Duration::from_secs(30);

/// Executes tool calls against a fixed set of registered tools.
#[derive(Clone)]
pub struct ToolInvoker {
    tools: Vec<Arc<dyn Tool>>,
    timeout: Duration,
}

impl Default for ToolInvoker {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl ToolInvoker {
    pub fn new(tools: Vec<Arc<dyn Tool>>) -> Self {
        Self {
            tools,
            timeout: DEFAULT_TOOL_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Definitions advertised to the model, in registration order.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|tool| tool.definition()).collect()
    }

    fn find(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.iter().find(|tool| tool.name() == name)
    }

    /// Invoke one call.
    pub async fn invoke(&self, call: &ToolCallRequest, cancel: &CancellationToken) -> ToolResult {
        let Some(tool) = self.find(&call.name) else {
            tracing::warn!(tool = %call.name, call_id = %call.id, "model requested unknown tool");
            return ToolResult::failed(call, format!("tool not available: {}", call.name));
        };

        if let Err(reason) = validate_arguments(&call.arguments, &tool.parameters().schema) {
            return ToolResult::failed(call, format!("Argument validation failed: {reason}"));
        }

        let args = ToolArguments::new(call.arguments.clone());
        let ctx = ToolExecutionContext {
            tool_call_id: Some(call.id.clone()),
            cancel: cancel.child_token(),
        };

        let outcome = tokio::select! {
            _ = cancel.cancelled() => Err(crate::error::CounselError::Canceled),
            result = with_timeout(self.timeout, tool.execute(&args, &ctx)) => result,
        };

        match outcome {
            Ok(value) => ToolResult::ok(call, &value),
            Err(error) => {
                tracing::warn!(tool = %call.name, call_id = %call.id, error = %error, "tool call failed");
                ToolResult::failed(call, error.to_string())
            }
        }
    }

    /// Invoke a batch concurrently. Results come back in request order.
    pub async fn invoke_all(
        &self,
        calls: &[ToolCallRequest],
        cancel: &CancellationToken,
    ) -> Vec<ToolResult> {
        future::join_all(calls.iter().map(|call| self.invoke(call, cancel))).await
    }
}

impl std::fmt::Debug for ToolInvoker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.tools.iter().map(|tool| tool.name()).collect();
        f.debug_struct("ToolInvoker")
            .field("tools", &names)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CounselError;
    use crate::tools::{AgentTool, ToolParameters};
    use pretty_assertions::assert_eq;

    fn echo_tool(delay: Duration) -> Arc<dyn Tool> {
        Arc::new(AgentTool::new(
            "web_search",
            "echo",
            ToolParameters::object().string("query", "q", true).build(),
            move |args, _ctx| async move {
                tokio::time::sleep(delay).await;
                Ok(serde_json::json!([{ "url": format!("https://{}.example", args.get_str("query")?) }]))
            },
        ))
    }

    fn failing_tool() -> Arc<dyn Tool> {
        Arc::new(AgentTool::new(
            "web_search",
            "fails",
            ToolParameters::object().string("query", "q", true).build(),
            |_args, _ctx| async move {
                Err(CounselError::ToolExecution {
                    tool_name: "web_search".into(),
                    message: "upstream down".into(),
                })
            },
        ))
    }

    fn call(id: &str, name: &str, args: serde_json::Value) -> ToolCallRequest {
        ToolCallRequest {
            id: id.into(),
            name: name.into(),
            arguments: args,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn batch_results_keep_request_order() {
        let invoker = ToolInvoker::new(vec![echo_tool(Duration::from_millis(10))]);
        let calls = vec![
            call("a", "web_search", serde_json::json!({ "query": "one" })),
            call("b", "web_search", serde_json::json!({ "query": "two" })),
        ];
        let results = invoker.invoke_all(&calls, &CancellationToken::new()).await;
        let ids: Vec<&str> = results.iter().map(|r| r.tool_call_id.as_str()).collect();
        assert_eq!(ids, ["a", "b"]);
        assert!(results.iter().all(|r| r.success));
        assert!(results[1].content.contains("two.example"));
    }

    #[tokio::test]
    async fn unknown_tool_is_answered_with_failure() {
        let invoker = ToolInvoker::new(vec![echo_tool(Duration::ZERO)]);
        let result = invoker
            .invoke(&call("x", "calculator", serde_json::json!({})), &CancellationToken::new())
            .await;
        assert!(!result.success);
        assert_eq!(result.tool_call_id, "x");
        assert!(result.content.contains("tool not available"));
    }

    #[tokio::test]
    async fn invalid_arguments_fail_without_running_tool() {
        let invoker = ToolInvoker::new(vec![echo_tool(Duration::ZERO)]);
        let result = invoker
            .invoke(&call("x", "web_search", serde_json::json!({})), &CancellationToken::new())
            .await;
        assert!(!result.success);
        assert!(result.content.contains("Argument validation failed"));
    }

    #[tokio::test]
    async fn tool_errors_become_failed_results() {
        let invoker = ToolInvoker::new(vec![failing_tool()]);
        let result = invoker
            .invoke(
                &call("x", "web_search", serde_json::json!({ "query": "q" })),
                &CancellationToken::new(),
            )
            .await;
        assert!(!result.success);
        assert!(result.content.contains("upstream down"));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_tool_times_out() {
        let invoker = ToolInvoker::new(vec![echo_tool(Duration::from_secs(60))])
            .with_timeout(Duration::from_secs(1));
        let result = invoker
            .invoke(
                &call("x", "web_search", serde_json::json!({ "query": "q" })),
                &CancellationToken::new(),
            )
            .await;
        assert!(!result.success);
        assert!(result.content.contains("Timeout"));
    }

    #[tokio::test]
    async fn canceled_token_short_circuits() {
        let invoker = ToolInvoker::new(vec![echo_tool(Duration::from_secs(60))]);
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = invoker
            .invoke(&call("x", "web_search", serde_json::json!({ "query": "q" })), &cancel)
            .await;
        assert!(!result.success);
        assert!(result.content.contains("Canceled"));
    }
}
