//! Wire and view types shared by the console panels
//!
//! Wire structs follow the agent service's JSON field names exactly
//! (a mix of camelCase and snake_case), so renames are spelled out per field.

use crate::error::{ConsoleError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Author of a transcript message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    /// Any role the console does not render (e.g. `system`, `tool`)
    #[serde(other)]
    Other,
}

/// A single unit of message content; only text is consumed
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentBlock {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl ContentBlock {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
        }
    }
}

/// A stored conversation message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    #[serde(default)]
    pub content: Vec<ContentBlock>,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: vec![ContentBlock::text(text)],
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: vec![ContentBlock::text(text)],
        }
    }

    /// Text of the first content block, the only one a transcript shows
    pub fn first_text(&self) -> Option<&str> {
        self.content.first().and_then(|b| b.text.as_deref())
    }
}

/// `GET /get_conversations` response
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversationResponse {
    #[serde(default)]
    pub messages: Vec<Message>,
}

/// `POST /cs_agent` request body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentRequest {
    pub prompt: String,
    #[serde(rename = "userId")]
    pub user_id: String,
}

/// The assistant message inside an agent response
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentReply {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(default)]
    pub content: Vec<ContentBlock>,
}

/// `POST /cs_agent` response
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentResponse {
    pub messages: AgentReply,

    #[serde(rename = "latencyMs", default, skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,

    #[serde(rename = "totalTokens", default, skip_serializing_if = "Option::is_none")]
    pub total_tokens: Option<u64>,

    /// Metric fields sent at the top level of the payload
    #[serde(flatten)]
    pub metrics: WireMetrics,

    /// Metric fields nested under `summary`, as the agent service sends them
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<WireMetrics>,
}

impl AgentResponse {
    /// Build a plain text reply with no metrics attached
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            messages: AgentReply {
                role: Some(Role::Assistant),
                content: vec![ContentBlock::text(text)],
            },
            ..Default::default()
        }
    }

    /// Text of the reply's first content block
    ///
    /// Fails with `MalformedResponse` when the reply has no text block.
    pub fn reply_text(&self) -> Result<&str> {
        self.messages
            .content
            .first()
            .and_then(|b| b.text.as_deref())
            .ok_or_else(|| {
                ConsoleError::malformed("/cs_agent", "reply has no text in its first content block")
            })
    }

    /// Metrics to hand to the summary panel
    ///
    /// Top-level fields win; the nested `summary` object is used only when
    /// no top-level metric field is present.
    pub fn metrics_summary(&self) -> MetricsSummary {
        let source = match (&self.summary, self.metrics.is_empty()) {
            (Some(nested), true) => nested,
            _ => &self.metrics,
        };
        MetricsSummary::from(source)
    }
}

/// Raw metric fields as the agent service reports them
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WireMetrics {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_cycles: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_duration: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average_cycle_time: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_usage: Option<HashMap<String, WireToolUsage>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accumulated_usage: Option<TokenUsage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accumulated_metrics: Option<LatencyMetrics>,
}

impl WireMetrics {
    pub fn is_empty(&self) -> bool {
        self.total_cycles.is_none()
            && self.total_duration.is_none()
            && self.average_cycle_time.is_none()
            && self.tool_usage.is_none()
            && self.accumulated_usage.is_none()
            && self.accumulated_metrics.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WireToolUsage {
    #[serde(default)]
    pub execution_stats: ToolStats,
}

/// Per-tool execution statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolStats {
    #[serde(default)]
    pub call_count: u64,
    /// Fraction of successful calls, 0..1
    #[serde(default)]
    pub success_rate: f64,
    /// Seconds
    #[serde(default)]
    pub average_time: f64,
}

/// Accumulated token counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenUsage {
    #[serde(default)]
    pub total_tokens: u64,
    #[serde(default)]
    pub input_tokens: u64,
    #[serde(default)]
    pub output_tokens: u64,
}

/// Accumulated latency counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LatencyMetrics {
    #[serde(default)]
    pub latency_ms: u64,
}

/// Cycle statistics for the summary panel
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CycleStats {
    pub total_cycles: u64,
    /// Seconds
    pub total_duration: f64,
    /// Seconds
    pub average_cycle_time: f64,
}

/// Snapshot handed from the chat flow to the summary panel
///
/// Replaced wholesale on every agent response; the backend owns the totals.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricsSummary {
    pub cycles: Option<CycleStats>,
    pub tool_usage: BTreeMap<String, ToolStats>,
    pub accumulated_usage: Option<TokenUsage>,
    pub accumulated_metrics: Option<LatencyMetrics>,
}

impl From<&WireMetrics> for MetricsSummary {
    fn from(wire: &WireMetrics) -> Self {
        let has_cycles = wire.total_cycles.is_some()
            || wire.total_duration.is_some()
            || wire.average_cycle_time.is_some();

        Self {
            cycles: has_cycles.then(|| CycleStats {
                total_cycles: wire.total_cycles.unwrap_or(0),
                total_duration: wire.total_duration.unwrap_or(0.0),
                average_cycle_time: wire.average_cycle_time.unwrap_or(0.0),
            }),
            tool_usage: wire
                .tool_usage
                .iter()
                .flatten()
                .map(|(name, usage)| (name.clone(), usage.execution_stats.clone()))
                .collect(),
            accumulated_usage: wire.accumulated_usage.clone(),
            accumulated_metrics: wire.accumulated_metrics.clone(),
        }
    }
}

/// `GET /get_available_tools` response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolCatalog {
    /// Tools the backend can enable, in display order
    #[serde(rename = "available_tools")]
    pub available: Vec<String>,

    /// Tools currently enabled on the backend
    #[serde(rename = "selected_tools")]
    pub selected: Vec<String>,

    #[serde(rename = "tool_descriptions", default)]
    pub descriptions: HashMap<String, String>,
}

/// Shown for tools the backend sent no description for
pub const NO_DESCRIPTION: &str = "No description available";

impl ToolCatalog {
    pub fn is_selected(&self, tool: &str) -> bool {
        self.selected.iter().any(|t| t == tool)
    }

    pub fn description(&self, tool: &str) -> &str {
        self.descriptions
            .get(tool)
            .map(String::as_str)
            .unwrap_or(NO_DESCRIPTION)
    }
}

/// `POST /update_tools` request body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateToolsRequest {
    pub tools: Vec<String>,
}

/// `POST /update_tools` response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateToolsResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub selected_tools: Vec<String>,
}

/// `GET`/`POST /system_prompt` body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemPromptBody {
    pub system_prompt: String,
}

/// `GET /health` response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_decoding_skips_unknown_fields() {
        let msg: Message = serde_json::from_value(serde_json::json!({
            "role": "assistant",
            "content": [{"text": "hi"}, {"toolUse": {"name": "calculator"}}]
        }))
        .unwrap();
        assert_eq!(msg.role, Role::Assistant);
        assert_eq!(msg.first_text(), Some("hi"));
        assert_eq!(msg.content.len(), 2);
    }

    #[test]
    fn test_unknown_role() {
        let msg: Message =
            serde_json::from_value(serde_json::json!({"role": "system", "content": []})).unwrap();
        assert_eq!(msg.role, Role::Other);
        assert!(msg.first_text().is_none());
    }

    #[test]
    fn test_agent_request_wire_names() {
        let req = AgentRequest {
            prompt: "2+2".to_string(),
            user_id: "u1".to_string(),
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json, serde_json::json!({"prompt": "2+2", "userId": "u1"}));
    }

    #[test]
    fn test_agent_response_top_level_metrics() {
        let resp: AgentResponse = serde_json::from_value(serde_json::json!({
            "messages": {"content": [{"text": "4"}]},
            "latencyMs": 120,
            "totalTokens": 42,
            "total_cycles": 2,
            "total_duration": 1.5,
            "average_cycle_time": 0.75,
            "tool_usage": {
                "calculator": {"execution_stats": {"call_count": 3, "success_rate": 0.6667, "average_time": 0.01}}
            },
            "accumulated_usage": {"totalTokens": 42, "inputTokens": 30, "outputTokens": 12}
        }))
        .unwrap();

        assert_eq!(resp.reply_text().unwrap(), "4");
        assert_eq!(resp.latency_ms, Some(120));
        assert_eq!(resp.total_tokens, Some(42));

        let summary = resp.metrics_summary();
        let cycles = summary.cycles.unwrap();
        assert_eq!(cycles.total_cycles, 2);
        assert_eq!(cycles.total_duration, 1.5);
        assert_eq!(summary.tool_usage["calculator"].call_count, 3);
        assert_eq!(summary.accumulated_usage.unwrap().input_tokens, 30);
        assert!(summary.accumulated_metrics.is_none());
    }

    #[test]
    fn test_agent_response_nested_summary() {
        let resp: AgentResponse = serde_json::from_value(serde_json::json!({
            "messages": {"role": "assistant", "content": [{"text": "done"}]},
            "latencyMs": 900,
            "totalTokens": 10,
            "summary": {
                "total_cycles": 1,
                "total_duration": 0.9,
                "average_cycle_time": 0.9,
                "tool_usage": {},
                "accumulated_metrics": {"latencyMs": 900}
            }
        }))
        .unwrap();

        let summary = resp.metrics_summary();
        assert_eq!(summary.cycles.unwrap().total_cycles, 1);
        assert!(summary.tool_usage.is_empty());
        assert_eq!(summary.accumulated_metrics.unwrap().latency_ms, 900);
    }

    #[test]
    fn test_agent_response_without_metrics() {
        let resp = AgentResponse::text("hello");
        assert_eq!(resp.metrics_summary(), MetricsSummary::default());
    }

    #[test]
    fn test_reply_without_text_is_malformed() {
        let resp: AgentResponse =
            serde_json::from_value(serde_json::json!({"messages": {"content": []}})).unwrap();
        let err = resp.reply_text().unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::MalformedResponse);
    }

    #[test]
    fn test_missing_messages_fails_decode() {
        let result = serde_json::from_value::<AgentResponse>(serde_json::json!({"latencyMs": 1}));
        assert!(result.is_err());
    }

    #[test]
    fn test_tool_catalog_descriptions() {
        let catalog: ToolCatalog = serde_json::from_value(serde_json::json!({
            "available_tools": ["a", "b"],
            "selected_tools": ["b"],
            "tool_descriptions": {"a": "First tool"}
        }))
        .unwrap();
        assert!(!catalog.is_selected("a"));
        assert!(catalog.is_selected("b"));
        assert_eq!(catalog.description("a"), "First tool");
        assert_eq!(catalog.description("b"), NO_DESCRIPTION);
    }

    #[test]
    fn test_tool_catalog_descriptions_optional() {
        let catalog: ToolCatalog = serde_json::from_value(serde_json::json!({
            "available_tools": [],
            "selected_tools": []
        }))
        .unwrap();
        assert!(catalog.descriptions.is_empty());
    }

    #[test]
    fn test_system_prompt_wire_name() {
        let body: SystemPromptBody =
            serde_json::from_str(r#"{"systemPrompt": "be brief"}"#).unwrap();
        assert_eq!(body.system_prompt, "be brief");
    }
}
