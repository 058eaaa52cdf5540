//! Agent backend trait — the seam between panels and the agent service
//!
//! Panels never build requests themselves; they call an `AgentBackend`.
//! `HttpBackend` talks to a live service, `MemoryBackend` stands in for it
//! in tests and demos.

use crate::error::Result;
use crate::types::{
    AgentRequest, AgentResponse, ConversationResponse, ToolCatalog, UpdateToolsResponse,
};
use async_trait::async_trait;
use std::fmt;

pub mod http;
pub mod memory;

/// Endpoints of the agent service consumed by the console
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Conversations,
    Agent,
    GetSystemPrompt,
    SetSystemPrompt,
    Tools,
    UpdateTools,
    Health,
}

impl Endpoint {
    pub const ALL: [Endpoint; 7] = [
        Endpoint::Conversations,
        Endpoint::Agent,
        Endpoint::GetSystemPrompt,
        Endpoint::SetSystemPrompt,
        Endpoint::Tools,
        Endpoint::UpdateTools,
        Endpoint::Health,
    ];

    /// Path relative to the service origin
    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::Conversations => "/get_conversations",
            Endpoint::Agent => "/cs_agent",
            Endpoint::GetSystemPrompt | Endpoint::SetSystemPrompt => "/system_prompt",
            Endpoint::Tools => "/get_available_tools",
            Endpoint::UpdateTools => "/update_tools",
            Endpoint::Health => "/health",
        }
    }

    pub fn method(&self) -> &'static str {
        match self {
            Endpoint::Agent | Endpoint::SetSystemPrompt | Endpoint::UpdateTools => "POST",
            _ => "GET",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method(), self.path())
    }
}

/// Core trait for agent backends
///
/// Every method maps to one endpoint. Implementations turn transport
/// failures, non-2xx statuses and undecodable bodies into the matching
/// `ConsoleError` variant; they never retry.
#[async_trait]
pub trait AgentBackend: Send + Sync {
    /// Fetch the stored transcript for a user
    async fn conversation(&self, user_id: &str) -> Result<ConversationResponse>;

    /// Send a prompt to the agent
    async fn invoke(&self, request: &AgentRequest) -> Result<AgentResponse>;

    /// Fetch the current system prompt
    async fn system_prompt(&self) -> Result<String>;

    /// Replace the system prompt (last writer wins)
    async fn set_system_prompt(&self, prompt: &str) -> Result<()>;

    /// Fetch available tools, selected tools and descriptions
    async fn tool_catalog(&self) -> Result<ToolCatalog>;

    /// Replace the selected tool set
    async fn update_tools(&self, tools: &[String]) -> Result<UpdateToolsResponse>;

    /// Backend name (e.g., "http", "memory")
    fn name(&self) -> &str;

    /// Health check — returns true if the service reports itself healthy
    ///
    /// Default implementation fetches the system prompt and returns true if
    /// that succeeds.
    async fn health(&self) -> Result<bool> {
        self.system_prompt().await.map(|_| true)
    }
}

pub use http::HttpBackend;
pub use memory::{Fault, MemoryBackend, RecordedCall};
