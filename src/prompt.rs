//! System prompt panel — load and persist the operator-editable prompt

use crate::backend::AgentBackend;
use crate::error::{ConsoleError, Result};
use crate::listener::Listeners;
use crate::notify::NotificationCenter;
use parking_lot::RwLock;
use std::sync::Arc;

pub const LOAD_FAILED: &str = "Failed to load system prompt. Please try again.";
pub const SAVE_FAILED: &str = "Failed to update system prompt. Please try again.";
pub const SAVED: &str = "System prompt updated successfully";
pub const EMPTY_PROMPT: &str = "Please enter a valid system prompt";

/// Change events emitted by the prompt panel
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptEvent {
    /// The field was populated from the backend
    Loaded(String),
    /// The backend accepted a new prompt
    Saved(String),
}

/// System prompt panel
pub struct SystemPromptPanel {
    backend: Arc<dyn AgentBackend>,
    notifications: Arc<NotificationCenter>,
    field: RwLock<String>,
    listeners: Arc<Listeners<PromptEvent>>,
}

impl SystemPromptPanel {
    pub fn new(backend: Arc<dyn AgentBackend>, notifications: Arc<NotificationCenter>) -> Self {
        Self {
            backend,
            notifications,
            field: RwLock::new(String::new()),
            listeners: Arc::new(Listeners::new()),
        }
    }

    /// Fetch the prompt into the field
    pub async fn load(&self) -> Result<()> {
        match self.backend.system_prompt().await {
            Ok(prompt) => {
                *self.field.write() = prompt.clone();
                self.listeners.emit(&PromptEvent::Loaded(prompt));
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, "Error loading system prompt");
                self.notifications.error(LOAD_FAILED);
                Err(e)
            }
        }
    }

    /// Submit `text` as the new prompt
    ///
    /// Blank input is rejected before any request. The field is not
    /// reloaded afterwards.
    pub async fn save(&self, text: &str) -> Result<()> {
        let prompt = text.trim();
        if prompt.is_empty() {
            self.notifications.error(EMPTY_PROMPT);
            return Err(ConsoleError::Validation(EMPTY_PROMPT.to_string()));
        }

        match self.backend.set_system_prompt(prompt).await {
            Ok(()) => {
                tracing::info!(chars = prompt.len(), "System prompt updated");
                self.notifications.success(SAVED);
                self.listeners.emit(&PromptEvent::Saved(prompt.to_string()));
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, "Error setting system prompt");
                self.notifications.error(SAVE_FAILED);
                Err(e)
            }
        }
    }

    /// Submit whatever the field currently holds
    pub async fn save_field(&self) -> Result<()> {
        let text = self.field();
        self.save(&text).await
    }

    /// Operator edit of the field
    pub fn set_field(&self, text: impl Into<String>) {
        *self.field.write() = text.into();
    }

    pub fn field(&self) -> String {
        self.field.read().clone()
    }

    pub fn listeners(&self) -> &Arc<Listeners<PromptEvent>> {
        &self.listeners
    }
}
