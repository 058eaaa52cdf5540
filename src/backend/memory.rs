//! In-memory agent backend for testing and single-process demos
//!
//! Keeps per-user transcripts, the system prompt and the tool catalog in
//! memory, the way the agent service keeps them on disk. Faults
//! and delays can be scripted per endpoint to exercise failure paths.

use super::{AgentBackend, Endpoint};
use crate::error::{ConsoleError, Result};
use crate::types::{
    AgentRequest, AgentResponse, ConversationResponse, LatencyMetrics, Message, TokenUsage,
    ToolCatalog, UpdateToolsResponse, WireMetrics,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

/// A scripted failure for the next call to an endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fault {
    /// Respond with a non-2xx status
    Status(u16),
    /// Fail as if the connection dropped
    Transport(String),
    /// Respond 2xx with a body that does not decode
    Malformed(String),
}

impl Fault {
    fn into_error(self, endpoint: Endpoint) -> ConsoleError {
        match self {
            Fault::Status(status) => ConsoleError::Http {
                endpoint: endpoint.path().to_string(),
                status,
            },
            Fault::Transport(reason) => ConsoleError::transport(endpoint.path(), reason),
            Fault::Malformed(reason) => ConsoleError::malformed(endpoint.path(), reason),
        }
    }
}

/// A call observed by the memory backend
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub endpoint: Endpoint,
    /// Query parameters or request body, as JSON
    pub payload: serde_json::Value,
}

struct MemoryState {
    conversations: HashMap<String, Vec<Message>>,
    system_prompt: String,
    catalog: ToolCatalog,
    replies: VecDeque<AgentResponse>,
    faults: HashMap<Endpoint, VecDeque<Fault>>,
    delays: HashMap<Endpoint, VecDeque<Duration>>,
    calls: Vec<RecordedCall>,
}

/// In-memory agent backend
///
/// Cheap to clone; clones share state, so a test can keep a handle for
/// scripting and inspection while a panel owns another.
#[derive(Clone)]
pub struct MemoryBackend {
    state: Arc<Mutex<MemoryState>>,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    /// Create a backend with a small default catalog
    pub fn new() -> Self {
        let descriptions = [
            ("calculator", "Perform mathematical calculations with support for advanced operations"),
            ("current_time", "Get the current time in various timezones"),
            ("http_request", "Make HTTP requests to external APIs with authentication support"),
            ("think", "Process thoughts through multiple recursive cycles"),
            ("use_aws", "Execute AWS service operations using boto3"),
        ];
        let catalog = ToolCatalog {
            available: descriptions.iter().map(|(name, _)| name.to_string()).collect(),
            selected: vec![
                "calculator".to_string(),
                "http_request".to_string(),
                "use_aws".to_string(),
            ],
            descriptions: descriptions
                .iter()
                .map(|(name, desc)| (name.to_string(), desc.to_string()))
                .collect(),
        };

        Self {
            state: Arc::new(Mutex::new(MemoryState {
                conversations: HashMap::new(),
                system_prompt: "You are a helpful assistant.".to_string(),
                catalog,
                replies: VecDeque::new(),
                faults: HashMap::new(),
                delays: HashMap::new(),
                calls: Vec::new(),
            })),
        }
    }

    pub fn with_catalog(self, catalog: ToolCatalog) -> Self {
        self.state.lock().catalog = catalog;
        self
    }

    pub fn with_system_prompt(self, prompt: impl Into<String>) -> Self {
        self.state.lock().system_prompt = prompt.into();
        self
    }

    pub fn with_conversation(self, user_id: impl Into<String>, messages: Vec<Message>) -> Self {
        self.state.lock().conversations.insert(user_id.into(), messages);
        self
    }

    /// Queue the response for the next agent call
    pub fn push_reply(&self, reply: AgentResponse) {
        self.state.lock().replies.push_back(reply);
    }

    /// Make the next call to `endpoint` fail
    pub fn fail_next(&self, endpoint: Endpoint, fault: Fault) {
        self.state
            .lock()
            .faults
            .entry(endpoint)
            .or_default()
            .push_back(fault);
    }

    /// Hold the next call to `endpoint` for `delay` before answering
    pub fn delay_next(&self, endpoint: Endpoint, delay: Duration) {
        self.state
            .lock()
            .delays
            .entry(endpoint)
            .or_default()
            .push_back(delay);
    }

    /// Every call seen so far, oldest first
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.state.lock().calls.clone()
    }

    pub fn call_count(&self, endpoint: Endpoint) -> usize {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|c| c.endpoint == endpoint)
            .count()
    }

    /// Stored transcript for a user
    pub fn conversation_of(&self, user_id: &str) -> Vec<Message> {
        self.state
            .lock()
            .conversations
            .get(user_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn current_system_prompt(&self) -> String {
        self.state.lock().system_prompt.clone()
    }

    pub fn selected_tools(&self) -> Vec<String> {
        self.state.lock().catalog.selected.clone()
    }

    /// Record the call, then apply any scripted delay and fault
    async fn begin(&self, endpoint: Endpoint, payload: serde_json::Value) -> Result<()> {
        let (delay, fault) = {
            let mut state = self.state.lock();
            state.calls.push(RecordedCall { endpoint, payload });
            let delay = state.delays.get_mut(&endpoint).and_then(VecDeque::pop_front);
            let fault = state.faults.get_mut(&endpoint).and_then(VecDeque::pop_front);
            (delay, fault)
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        match fault {
            Some(fault) => {
                tracing::debug!(endpoint = %endpoint, ?fault, "Scripted fault");
                Err(fault.into_error(endpoint))
            }
            None => Ok(()),
        }
    }
}

/// Default reply when nothing was queued: echo with single-cycle metrics
fn echo_reply(prompt: &str) -> AgentResponse {
    let text = format!("You said: {}", prompt);
    let input_tokens = prompt.split_whitespace().count() as u64;
    let output_tokens = text.split_whitespace().count() as u64;
    let total_tokens = input_tokens + output_tokens;

    let mut reply = AgentResponse::text(text);
    reply.latency_ms = Some(1);
    reply.total_tokens = Some(total_tokens);
    reply.summary = Some(WireMetrics {
        total_cycles: Some(1),
        total_duration: Some(0.001),
        average_cycle_time: Some(0.001),
        tool_usage: Some(HashMap::new()),
        accumulated_usage: Some(TokenUsage {
            total_tokens,
            input_tokens,
            output_tokens,
        }),
        accumulated_metrics: Some(LatencyMetrics { latency_ms: 1 }),
    });
    reply
}

#[async_trait]
impl AgentBackend for MemoryBackend {
    async fn conversation(&self, user_id: &str) -> Result<ConversationResponse> {
        self.begin(
            Endpoint::Conversations,
            serde_json::json!({ "userId": user_id }),
        )
        .await?;
        Ok(ConversationResponse {
            messages: self.conversation_of(user_id),
        })
    }

    async fn invoke(&self, request: &AgentRequest) -> Result<AgentResponse> {
        self.begin(Endpoint::Agent, serde_json::to_value(request)?)
            .await?;

        let mut state = self.state.lock();
        let reply = state
            .replies
            .pop_front()
            .unwrap_or_else(|| echo_reply(&request.prompt));

        let transcript = state
            .conversations
            .entry(request.user_id.clone())
            .or_default();
        transcript.push(Message::user(request.prompt.clone()));
        if let Ok(text) = reply.reply_text() {
            transcript.push(Message::assistant(text));
        }

        Ok(reply)
    }

    async fn system_prompt(&self) -> Result<String> {
        self.begin(Endpoint::GetSystemPrompt, serde_json::Value::Null)
            .await?;
        Ok(self.current_system_prompt())
    }

    async fn set_system_prompt(&self, prompt: &str) -> Result<()> {
        self.begin(
            Endpoint::SetSystemPrompt,
            serde_json::json!({ "systemPrompt": prompt }),
        )
        .await?;
        self.state.lock().system_prompt = prompt.to_string();
        Ok(())
    }

    async fn tool_catalog(&self) -> Result<ToolCatalog> {
        self.begin(Endpoint::Tools, serde_json::Value::Null).await?;
        Ok(self.state.lock().catalog.clone())
    }

    async fn update_tools(&self, tools: &[String]) -> Result<UpdateToolsResponse> {
        self.begin(Endpoint::UpdateTools, serde_json::json!({ "tools": tools }))
            .await?;

        let mut state = self.state.lock();
        if let Some(unknown) = tools
            .iter()
            .find(|t| !state.catalog.available.contains(t))
        {
            tracing::warn!(tool = %unknown, "Rejected unknown tool");
            return Err(Fault::Status(400).into_error(Endpoint::UpdateTools));
        }

        state.catalog.selected = tools.to_vec();
        tracing::info!(tools = ?tools, "Updated tools list");
        Ok(UpdateToolsResponse {
            success: true,
            selected_tools: tools.to_vec(),
        })
    }

    fn name(&self) -> &str {
        "memory"
    }

    async fn health(&self) -> Result<bool> {
        self.begin(Endpoint::Health, serde_json::Value::Null).await?;
        Ok(true)
    }
}
