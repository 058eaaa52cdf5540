//! Tool catalog panel — pick which backend tools are enabled
//!
//! The rendered checkbox state is authoritative between `init` calls. A
//! successful `update` does not re-fetch the catalog.

use crate::backend::AgentBackend;
use crate::error::{ConsoleError, Result};
use crate::listener::Listeners;
use crate::notify::NotificationCenter;
use crate::types::ToolCatalog;
use parking_lot::RwLock;
use std::collections::{BTreeSet, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Static text that replaces the panel when the catalog cannot be fetched
pub const LOAD_FAILED: &str = "Failed to load tools";
pub const UPDATED: &str = "Tools updated successfully";
/// Backend answered but did not report success
pub const UPDATE_REJECTED: &str = "Failed to update tools";
/// The request itself failed
pub const UPDATE_FAILED: &str = "Error updating tools";
/// `update` called while no catalog is rendered
pub const NOT_LOADED: &str = "Tool catalog is not loaded";

/// One checkbox row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolRow {
    pub name: String,
    pub description: String,
    pub checked: bool,
}

/// What the panel currently shows
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ToolPanelState {
    #[default]
    Uninitialized,
    Loading,
    Ready(Vec<ToolRow>),
    /// Terminal for this panel instance
    Failed(String),
}

/// Change events emitted by the tool panel
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolEvent {
    Loading,
    Rendered(Vec<ToolRow>),
    Failed(String),
    Toggled { name: String, checked: bool },
    /// The backend accepted this selection
    Updated(Vec<String>),
}

/// One row per available tool, checked iff selected
pub fn render_rows(catalog: &ToolCatalog) -> Vec<ToolRow> {
    let mut seen = HashSet::new();
    catalog
        .available
        .iter()
        .filter(|name| seen.insert(*name))
        .map(|name| ToolRow {
            name: name.clone(),
            description: catalog.description(name).to_string(),
            checked: catalog.is_selected(name),
        })
        .collect()
}

/// Tool catalog panel
pub struct ToolPanel {
    backend: Arc<dyn AgentBackend>,
    notifications: Arc<NotificationCenter>,
    state: RwLock<ToolPanelState>,
    generation: AtomicU64,
    listeners: Arc<Listeners<ToolEvent>>,
}

impl ToolPanel {
    pub fn new(backend: Arc<dyn AgentBackend>, notifications: Arc<NotificationCenter>) -> Self {
        Self {
            backend,
            notifications,
            state: RwLock::new(ToolPanelState::Uninitialized),
            generation: AtomicU64::new(0),
            listeners: Arc::new(Listeners::new()),
        }
    }

    /// Fetch the catalog and render its rows
    ///
    /// Only the latest of overlapping calls is applied. After a failed
    /// fetch the panel stays failed and further calls do nothing.
    pub async fn init(&self) -> Result<()> {
        if matches!(*self.state.read(), ToolPanelState::Failed(_)) {
            tracing::debug!("Tool panel failed earlier, ignoring init");
            return Ok(());
        }

        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        self.set_state(ToolPanelState::Loading, ToolEvent::Loading);

        let result = self.backend.tool_catalog().await;

        if self.generation.load(Ordering::Acquire) != generation {
            tracing::debug!(generation, "Dropping stale tool catalog");
            return Ok(());
        }

        match result {
            Ok(catalog) => {
                let rows = render_rows(&catalog);
                tracing::debug!(
                    available = rows.len(),
                    selected = catalog.selected.len(),
                    "Tool catalog loaded"
                );
                self.set_state(ToolPanelState::Ready(rows.clone()), ToolEvent::Rendered(rows));
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, "Error fetching tools");
                self.set_state(
                    ToolPanelState::Failed(LOAD_FAILED.to_string()),
                    ToolEvent::Failed(LOAD_FAILED.to_string()),
                );
                Err(e)
            }
        }
    }

    /// Flip a checkbox. Returns the new state, or `None` for an unknown row.
    pub fn toggle(&self, name: &str) -> Option<bool> {
        let checked = {
            let mut state = self.state.write();
            let ToolPanelState::Ready(rows) = &mut *state else {
                return None;
            };
            let row = rows.iter_mut().find(|r| r.name == name)?;
            row.checked = !row.checked;
            row.checked
        };
        self.listeners.emit(&ToolEvent::Toggled {
            name: name.to_string(),
            checked,
        });
        Some(checked)
    }

    /// Currently checked tools
    pub fn checked(&self) -> BTreeSet<String> {
        match &*self.state.read() {
            ToolPanelState::Ready(rows) => rows
                .iter()
                .filter(|r| r.checked)
                .map(|r| r.name.clone())
                .collect(),
            _ => BTreeSet::new(),
        }
    }

    /// Submit the checked set
    ///
    /// Returns whether the backend reported success. Refuses to submit
    /// while no catalog is rendered, since that would clear every tool.
    pub async fn update(&self) -> Result<bool> {
        if !matches!(*self.state.read(), ToolPanelState::Ready(_)) {
            tracing::warn!("Tool update requested before the catalog loaded");
            self.notifications.error(NOT_LOADED);
            return Err(ConsoleError::Validation(NOT_LOADED.to_string()));
        }

        let tools: Vec<String> = self.checked().into_iter().collect();
        match self.backend.update_tools(&tools).await {
            Ok(response) if response.success => {
                tracing::info!(tools = ?tools, "Tools updated");
                self.notifications.success(UPDATED);
                self.listeners.emit(&ToolEvent::Updated(tools));
                Ok(true)
            }
            Ok(_) => {
                tracing::warn!(tools = ?tools, "Backend did not accept tool update");
                self.notifications.error(UPDATE_REJECTED);
                Ok(false)
            }
            Err(e) => {
                tracing::error!(error = %e, "Error updating tools");
                self.notifications.error(UPDATE_FAILED);
                Err(e)
            }
        }
    }

    pub fn state(&self) -> ToolPanelState {
        self.state.read().clone()
    }

    pub fn rows(&self) -> Vec<ToolRow> {
        match &*self.state.read() {
            ToolPanelState::Ready(rows) => rows.clone(),
            _ => Vec::new(),
        }
    }

    pub fn listeners(&self) -> &Arc<Listeners<ToolEvent>> {
        &self.listeners
    }

    fn set_state(&self, state: ToolPanelState, event: ToolEvent) {
        *self.state.write() = state;
        self.listeners.emit(&event);
    }
}
