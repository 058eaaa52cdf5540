//! # a3s-console
//!
//! Session and view-state reconciliation for A3S agent operator consoles.
//!
//! ## Overview
//!
//! `a3s-console` holds the state behind an operator console for a
//! conversational agent: a chat transcript, the tool selection, the system
//! prompt and a metrics summary. Renderers subscribe to panel events; the
//! panels talk to the agent service through a pluggable backend.
//!
//! ## Quick Start
//!
//! ```rust
//! use a3s_console::{Console, ConsoleConfig, MemoryBackend};
//! use std::sync::Arc;
//!
//! # async fn example() -> a3s_console::Result<()> {
//! let console = Console::new(ConsoleConfig::default(), Arc::new(MemoryBackend::new()));
//! console.start().await;
//!
//! console.chat().set_input("2+2");
//! console.chat().submit().await?;
//!
//! for entry in console.chat().transcript() {
//!     println!("{:?}", entry);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Backends
//!
//! - **http** — JSON over HTTP to a running agent service
//! - **memory** — In-process backend for testing and demos
//!
//! ## Architecture
//!
//! - **AgentBackend** trait — one method per agent service endpoint
//! - **ChatController** — session, transcript and the single-flight send cycle
//! - **ToolPanel** / **SystemPromptPanel** — independent sibling panels
//! - **MetricsPanel** — renders the metrics carried by each agent response
//! - **NotificationCenter** — auto-dismissing banners with cancellable timers

pub mod backend;
pub mod chat;
pub mod config;
pub mod console;
pub mod error;
pub mod listener;
pub mod metrics;
pub mod notify;
pub mod prompt;
pub mod tools;
pub mod types;

// Re-export core types
pub use backend::{AgentBackend, Endpoint, Fault, HttpBackend, MemoryBackend, RecordedCall};
pub use chat::{ChatController, ChatEvent, SendOutcome, Session, Speaker, TranscriptEntry};
pub use config::{ConsoleConfig, NotificationConfig};
pub use console::{Console, StartReport};
pub use error::{ConsoleError, ErrorKind, Result};
pub use listener::{EventStream, ListenerId, Listeners};
pub use metrics::{MetricsEvent, MetricsPanel, MetricsView, SummaryItem, SummarySection};
pub use notify::{Banner, BannerPhase, NotificationCenter, NotificationEvent, NotificationKind};
pub use prompt::{PromptEvent, SystemPromptPanel};
pub use tools::{ToolEvent, ToolPanel, ToolPanelState, ToolRow};
pub use types::{
    AgentRequest, AgentResponse, ContentBlock, Message, MetricsSummary, Role, ToolCatalog,
};
