//! Chat panel — session identity, transcript and the send/receive cycle
//!
//! The controller is the orchestrator: after every agent exchange it
//! updates its own transcript and displays, then hands the response's
//! metrics to the [`MetricsPanel`].
//!
//! Two guards keep the view consistent:
//!
//! - a busy flag admits at most one in-flight send; a send triggered while
//!   busy is dropped, not queued
//! - transcript loads carry a generation number, and a response older than
//!   the latest issued load is discarded

use crate::backend::AgentBackend;
use crate::error::{ConsoleError, Result};
use crate::listener::Listeners;
use crate::metrics::MetricsPanel;
use crate::notify::NotificationCenter;
use crate::types::{AgentRequest, AgentResponse, Message, Role};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

pub const LOAD_FAILED: &str = "Failed to load conversation. Please try again.";
pub const SEND_FAILED: &str = "Failed to send message. Please try again.";
pub const INVALID_USER: &str = "Please enter a valid User ID";
pub const DEFAULT_WELCOME: &str = "Welcome! How can I help you today?";

/// Speaker of a rendered transcript line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speaker {
    User,
    Assistant,
}

/// One rendered line of the transcript
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscriptEntry {
    Message { speaker: Speaker, text: String },
    /// Canned greeting shown when a loaded transcript is empty
    Welcome(String),
    /// Loading indicator, for a transcript load or a pending reply
    Placeholder(u64),
}

impl TranscriptEntry {
    pub fn user(text: impl Into<String>) -> Self {
        TranscriptEntry::Message {
            speaker: Speaker::User,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        TranscriptEntry::Message {
            speaker: Speaker::Assistant,
            text: text.into(),
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, TranscriptEntry::Placeholder(_))
    }

    /// Render a stored message; `None` for roles and blocks the panel skips
    fn from_message(message: &Message) -> Option<Self> {
        let text = message.first_text()?;
        match message.role {
            Role::User => Some(Self::user(text)),
            Role::Assistant => Some(Self::assistant(text)),
            Role::Other => None,
        }
    }
}

/// Operator session state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: String,
}

/// Result of a send that did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// The reply was received and rendered
    Delivered,
    /// Blank input; nothing was sent
    Empty,
    /// Another send was in flight; this one was dropped
    Busy,
}

/// Change events emitted by the chat panel
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatEvent {
    /// The transcript was rebuilt wholesale
    Reset(Vec<TranscriptEntry>),
    Appended(TranscriptEntry),
    /// A pending-reply placeholder was replaced by the reply
    Resolved { placeholder: u64, entry: TranscriptEntry },
    PlaceholderRemoved(u64),
    StatsUpdated { latency: String, tokens: String },
    InputChanged(String),
    UserChanged(String),
}

struct ChatView {
    transcript: Vec<TranscriptEntry>,
    input: String,
    latency: String,
    tokens: String,
}

/// Held for the lifetime of one send
///
/// Dropping it clears the busy flag. While armed it also removes the
/// pending-reply placeholder and the metrics loading state, so a send that
/// fails or is cancelled mid-request leaves no spinner behind.
struct SendGuard<'a> {
    chat: &'a ChatController,
    placeholder: Option<u64>,
}

impl<'a> SendGuard<'a> {
    fn acquire(chat: &'a ChatController) -> Option<Self> {
        chat.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| SendGuard {
                chat,
                placeholder: None,
            })
    }

    fn arm(&mut self, placeholder: u64) {
        self.placeholder = Some(placeholder);
    }

    /// The placeholder was resolved; nothing to clean up
    fn disarm(&mut self) {
        self.placeholder = None;
    }
}

impl Drop for SendGuard<'_> {
    fn drop(&mut self) {
        if let Some(placeholder) = self.placeholder.take() {
            self.chat.remove_placeholder(placeholder);
            self.chat.metrics.clear();
        }
        self.chat.busy.store(false, Ordering::Release);
    }
}

fn latency_text(latency_ms: Option<u64>) -> String {
    format!("{} ms", latency_ms.unwrap_or(0))
}

fn tokens_text(total_tokens: Option<u64>) -> String {
    total_tokens.unwrap_or(0).to_string()
}

/// Chat panel controller
pub struct ChatController {
    backend: Arc<dyn AgentBackend>,
    notifications: Arc<NotificationCenter>,
    metrics: Arc<MetricsPanel>,
    session: RwLock<Session>,
    welcome_message: String,
    view: RwLock<ChatView>,
    busy: AtomicBool,
    load_generation: AtomicU64,
    next_placeholder: AtomicU64,
    listeners: Arc<Listeners<ChatEvent>>,
}

impl ChatController {
    pub fn new(
        backend: Arc<dyn AgentBackend>,
        notifications: Arc<NotificationCenter>,
        metrics: Arc<MetricsPanel>,
        user_id: impl Into<String>,
    ) -> Self {
        Self {
            backend,
            notifications,
            metrics,
            session: RwLock::new(Session {
                user_id: user_id.into(),
            }),
            welcome_message: DEFAULT_WELCOME.to_string(),
            view: RwLock::new(ChatView {
                transcript: Vec::new(),
                input: String::new(),
                latency: latency_text(None),
                tokens: tokens_text(None),
            }),
            busy: AtomicBool::new(false),
            load_generation: AtomicU64::new(0),
            next_placeholder: AtomicU64::new(1),
            listeners: Arc::new(Listeners::new()),
        }
    }

    pub fn with_welcome_message(mut self, message: impl Into<String>) -> Self {
        self.welcome_message = message.into();
        self
    }

    /// Fetch and render the stored transcript for `user_id`
    ///
    /// The transcript shows a single placeholder while the request is out.
    /// On failure the area is left empty and an error banner is shown.
    pub async fn load_conversation(&self, user_id: &str) -> Result<()> {
        let generation = self.load_generation.fetch_add(1, Ordering::AcqRel) + 1;
        let placeholder = self.placeholder_id();
        self.reset_transcript(vec![TranscriptEntry::Placeholder(placeholder)]);

        let result = self.backend.conversation(user_id).await;

        if self.load_generation.load(Ordering::Acquire) != generation {
            tracing::debug!(user_id, generation, "Dropping stale conversation load");
            return Ok(());
        }

        match result {
            Ok(response) => {
                let mut entries: Vec<TranscriptEntry> = response
                    .messages
                    .iter()
                    .filter_map(TranscriptEntry::from_message)
                    .collect();
                if entries.is_empty() {
                    entries.push(TranscriptEntry::Welcome(self.welcome_message.clone()));
                }
                tracing::debug!(user_id, entries = entries.len(), "Conversation loaded");
                self.reset_transcript(entries);
                Ok(())
            }
            Err(e) => {
                tracing::error!(user_id, error = %e, "Error loading conversation");
                self.reset_transcript(Vec::new());
                self.notifications.error(LOAD_FAILED);
                Err(e)
            }
        }
    }

    /// Reload the transcript for the current session
    pub async fn reload(&self) -> Result<()> {
        let user_id = self.user_id();
        self.load_conversation(&user_id).await
    }

    /// Switch the session to another user and reload the transcript
    pub async fn set_user_id(&self, user_id: &str) -> Result<()> {
        let user_id = user_id.trim();
        if user_id.is_empty() {
            self.notifications.error(INVALID_USER);
            return Err(ConsoleError::Validation(INVALID_USER.to_string()));
        }

        self.session.write().user_id = user_id.to_string();
        self.listeners.emit(&ChatEvent::UserChanged(user_id.to_string()));
        tracing::info!(user_id, "Session user changed");
        self.load_conversation(user_id).await
    }

    /// Send `text` to the agent on behalf of `user_id`
    ///
    /// Blank text and sends made while another is in flight return early
    /// without touching the transcript or the backend. The user message is
    /// appended before the request and is kept when the request fails or
    /// the returned future is dropped.
    pub async fn send_message(&self, text: &str, user_id: &str) -> Result<SendOutcome> {
        let prompt = text.trim();
        if prompt.is_empty() {
            return Ok(SendOutcome::Empty);
        }
        let Some(mut guard) = SendGuard::acquire(self) else {
            tracing::debug!(user_id, "Send already in flight, dropping");
            return Ok(SendOutcome::Busy);
        };

        self.append(TranscriptEntry::user(prompt));
        self.set_input(String::new());
        let placeholder = self.placeholder_id();
        self.append(TranscriptEntry::Placeholder(placeholder));
        guard.arm(placeholder);
        self.metrics.show_loading();

        let request = AgentRequest {
            prompt: prompt.to_string(),
            user_id: user_id.to_string(),
        };
        let result = match self.backend.invoke(&request).await {
            Ok(response) => response
                .reply_text()
                .map(str::to_owned)
                .map(|reply| (reply, response)),
            Err(e) => Err(e),
        };

        match result {
            Ok((reply, response)) => {
                guard.disarm();
                self.resolve(placeholder, TranscriptEntry::assistant(reply));
                self.set_stats(&response);
                self.metrics.update(&response.metrics_summary());
                Ok(SendOutcome::Delivered)
            }
            Err(e) => {
                tracing::error!(user_id, error = %e, "Error sending message");
                drop(guard);
                self.notifications.error(SEND_FAILED);
                Err(e)
            }
        }
    }

    /// Send the input field's contents as the session user
    pub async fn submit(&self) -> Result<SendOutcome> {
        let text = self.input();
        let user_id = self.user_id();
        self.send_message(&text, &user_id).await
    }

    /// Operator edit of the input field
    pub fn set_input(&self, text: impl Into<String>) {
        let text = text.into();
        self.view.write().input = text.clone();
        self.listeners.emit(&ChatEvent::InputChanged(text));
    }

    pub fn input(&self) -> String {
        self.view.read().input.clone()
    }

    pub fn session(&self) -> Session {
        self.session.read().clone()
    }

    pub fn user_id(&self) -> String {
        self.session.read().user_id.clone()
    }

    pub fn transcript(&self) -> Vec<TranscriptEntry> {
        self.view.read().transcript.clone()
    }

    /// Latency display, e.g. `120 ms`
    pub fn latency(&self) -> String {
        self.view.read().latency.clone()
    }

    /// Token display, e.g. `42`
    pub fn tokens(&self) -> String {
        self.view.read().tokens.clone()
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    pub fn listeners(&self) -> &Arc<Listeners<ChatEvent>> {
        &self.listeners
    }

    fn placeholder_id(&self) -> u64 {
        self.next_placeholder.fetch_add(1, Ordering::Relaxed)
    }

    fn reset_transcript(&self, entries: Vec<TranscriptEntry>) {
        self.view.write().transcript = entries.clone();
        self.listeners.emit(&ChatEvent::Reset(entries));
    }

    fn append(&self, entry: TranscriptEntry) {
        self.view.write().transcript.push(entry.clone());
        self.listeners.emit(&ChatEvent::Appended(entry));
    }

    /// Swap a placeholder for the reply. A transcript reload during the send
    /// has already discarded the placeholder; the reply is then not shown.
    fn resolve(&self, placeholder: u64, entry: TranscriptEntry) {
        let replaced = {
            let mut view = self.view.write();
            match view
                .transcript
                .iter_mut()
                .find(|e| **e == TranscriptEntry::Placeholder(placeholder))
            {
                Some(slot) => {
                    *slot = entry.clone();
                    true
                }
                None => false,
            }
        };
        if replaced {
            self.listeners
                .emit(&ChatEvent::Resolved { placeholder, entry });
        } else {
            tracing::debug!(placeholder, "Transcript reloaded during send, reply not shown");
        }
    }

    fn remove_placeholder(&self, placeholder: u64) {
        let removed = {
            let mut view = self.view.write();
            let before = view.transcript.len();
            view.transcript
                .retain(|e| *e != TranscriptEntry::Placeholder(placeholder));
            view.transcript.len() != before
        };
        if removed {
            self.listeners
                .emit(&ChatEvent::PlaceholderRemoved(placeholder));
        }
    }

    fn set_stats(&self, response: &AgentResponse) {
        let latency = latency_text(response.latency_ms);
        let tokens = tokens_text(response.total_tokens);
        {
            let mut view = self.view.write();
            view.latency = latency.clone();
            view.tokens = tokens.clone();
        }
        self.listeners
            .emit(&ChatEvent::StatsUpdated { latency, tokens });
    }
}
