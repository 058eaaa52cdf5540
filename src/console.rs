//! Console — wires every panel to one backend and one banner surface

use crate::backend::{AgentBackend, HttpBackend};
use crate::chat::ChatController;
use crate::config::ConsoleConfig;
use crate::error::Result;
use crate::metrics::MetricsPanel;
use crate::notify::NotificationCenter;
use crate::prompt::SystemPromptPanel;
use crate::tools::ToolPanel;
use std::sync::Arc;

/// Outcome of the initial load of each panel
///
/// Panels initialize independently; one failing does not stop the others.
#[derive(Debug)]
pub struct StartReport {
    pub conversation: Result<()>,
    pub system_prompt: Result<()>,
    pub tools: Result<()>,
}

impl StartReport {
    pub fn is_ok(&self) -> bool {
        self.conversation.is_ok() && self.system_prompt.is_ok() && self.tools.is_ok()
    }
}

/// The operator console
pub struct Console {
    config: ConsoleConfig,
    backend: Arc<dyn AgentBackend>,
    notifications: Arc<NotificationCenter>,
    metrics: Arc<MetricsPanel>,
    chat: ChatController,
    tools: ToolPanel,
    prompt: SystemPromptPanel,
}

impl Console {
    /// Build a console over any backend
    pub fn new(config: ConsoleConfig, backend: Arc<dyn AgentBackend>) -> Self {
        let notifications = Arc::new(NotificationCenter::new(config.notifications.clone()));
        let metrics = Arc::new(MetricsPanel::new());
        let chat = ChatController::new(
            backend.clone(),
            notifications.clone(),
            metrics.clone(),
            config.default_user_id.clone(),
        )
        .with_welcome_message(config.welcome_message.clone());
        let tools = ToolPanel::new(backend.clone(), notifications.clone());
        let prompt = SystemPromptPanel::new(backend.clone(), notifications.clone());

        Self {
            config,
            backend,
            notifications,
            metrics,
            chat,
            tools,
            prompt,
        }
    }

    /// Build a console talking HTTP to `config.base_url`
    pub fn connect(config: ConsoleConfig) -> Result<Self> {
        let backend = HttpBackend::from_config(&config)?;
        Ok(Self::new(config, Arc::new(backend)))
    }

    /// Run every panel's initial load concurrently
    pub async fn start(&self) -> StartReport {
        tracing::info!(
            backend = self.backend.name(),
            user_id = %self.chat.user_id(),
            "Starting console"
        );
        let (conversation, system_prompt, tools) =
            futures::join!(self.chat.reload(), self.prompt.load(), self.tools.init());

        let report = StartReport {
            conversation,
            system_prompt,
            tools,
        };
        if !report.is_ok() {
            tracing::warn!(?report, "Some panels failed to initialize");
        }
        report
    }

    /// Cancel banner timers and drop every listener
    pub fn teardown(&self) {
        self.notifications.teardown();
        self.metrics.listeners().clear();
        self.chat.listeners().clear();
        self.tools.listeners().clear();
        self.prompt.listeners().clear();
        tracing::debug!("Console torn down");
    }

    pub fn config(&self) -> &ConsoleConfig {
        &self.config
    }

    pub fn backend(&self) -> &Arc<dyn AgentBackend> {
        &self.backend
    }

    pub fn notifications(&self) -> &Arc<NotificationCenter> {
        &self.notifications
    }

    pub fn metrics(&self) -> &Arc<MetricsPanel> {
        &self.metrics
    }

    pub fn chat(&self) -> &ChatController {
        &self.chat
    }

    pub fn tools(&self) -> &ToolPanel {
        &self.tools
    }

    pub fn prompt(&self) -> &SystemPromptPanel {
        &self.prompt
    }
}
