//! Notification surface — transient, auto-dismissing status banners
//!
//! Each banner walks `Entering → Visible → Leaving → removed` on its own
//! timer task. Banners stack independently. Timers are cancellable through
//! [`NotificationCenter::dismiss`] and [`NotificationCenter::teardown`], and
//! are aborted when the center is dropped.

use crate::config::NotificationConfig;
use crate::listener::Listeners;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Banner severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Info,
    Success,
    Error,
}

/// Lifecycle phase of a banner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerPhase {
    /// Attached but not yet shown (transition-in pending)
    Entering,
    Visible,
    /// Hidden, waiting for the transition-out to finish
    Leaving,
}

/// A banner currently attached to the surface
#[derive(Debug, Clone, PartialEq)]
pub struct Banner {
    /// Unique banner identifier (ntf-<uuid>)
    pub id: String,
    pub message: String,
    pub kind: NotificationKind,
    pub phase: BannerPhase,
    pub created_at: DateTime<Utc>,
}

/// Change events emitted by the notification surface
#[derive(Debug, Clone, PartialEq)]
pub enum NotificationEvent {
    Added(Banner),
    Shown { id: String },
    Hiding { id: String },
    Removed { id: String },
}

struct Inner {
    banners: Mutex<Vec<Banner>>,
    timers: Mutex<HashMap<String, JoinHandle<()>>>,
    listeners: Arc<Listeners<NotificationEvent>>,
}

impl Inner {
    fn set_phase(&self, id: &str, phase: BannerPhase) -> bool {
        let mut banners = self.banners.lock();
        match banners.iter_mut().find(|b| b.id == id) {
            Some(banner) => {
                banner.phase = phase;
                true
            }
            None => false,
        }
    }

    fn remove(&self, id: &str) -> bool {
        let removed = {
            let mut banners = self.banners.lock();
            let before = banners.len();
            banners.retain(|b| b.id != id);
            banners.len() != before
        };
        if removed {
            self.listeners.emit(&NotificationEvent::Removed { id: id.to_string() });
        }
        removed
    }
}

/// Shared banner surface used by every panel
pub struct NotificationCenter {
    config: NotificationConfig,
    inner: Arc<Inner>,
}

impl NotificationCenter {
    pub fn new(config: NotificationConfig) -> Self {
        Self {
            config,
            inner: Arc::new(Inner {
                banners: Mutex::new(Vec::new()),
                timers: Mutex::new(HashMap::new()),
                listeners: Arc::new(Listeners::new()),
            }),
        }
    }

    /// Attach a banner and start its lifecycle timers
    ///
    /// Returns the banner id. Outside a tokio runtime the banner is shown
    /// immediately and stays until dismissed.
    pub fn notify(&self, message: impl Into<String>, kind: NotificationKind) -> String {
        let banner = Banner {
            id: format!("ntf-{}", uuid::Uuid::new_v4()),
            message: message.into(),
            kind,
            phase: BannerPhase::Entering,
            created_at: Utc::now(),
        };
        let id = banner.id.clone();

        self.inner.banners.lock().push(banner.clone());
        self.inner.listeners.emit(&NotificationEvent::Added(banner));

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!(banner = %id, "No runtime for banner timers; banner stays until dismissed");
            self.inner.set_phase(&id, BannerPhase::Visible);
            self.inner
                .listeners
                .emit(&NotificationEvent::Shown { id: id.clone() });
            return id;
        };

        let show_delay = Duration::from_millis(self.config.show_delay_ms);
        let display = self.display_duration(kind);
        let transition = Duration::from_millis(self.config.transition_ms);

        // Held across spawn so the task cannot finish before its handle is stored
        let mut timers = self.inner.timers.lock();
        let inner = Arc::clone(&self.inner);
        let task_id = id.clone();
        let handle = runtime.spawn(async move {
            tokio::time::sleep(show_delay).await;
            if inner.set_phase(&task_id, BannerPhase::Visible) {
                inner
                    .listeners
                    .emit(&NotificationEvent::Shown { id: task_id.clone() });
            }

            tokio::time::sleep(display).await;
            if inner.set_phase(&task_id, BannerPhase::Leaving) {
                inner
                    .listeners
                    .emit(&NotificationEvent::Hiding { id: task_id.clone() });
            }

            tokio::time::sleep(transition).await;
            inner.timers.lock().remove(&task_id);
            inner.remove(&task_id);
        });
        timers.insert(id.clone(), handle);

        id
    }

    pub fn info(&self, message: impl Into<String>) -> String {
        self.notify(message, NotificationKind::Info)
    }

    pub fn success(&self, message: impl Into<String>) -> String {
        self.notify(message, NotificationKind::Success)
    }

    pub fn error(&self, message: impl Into<String>) -> String {
        self.notify(message, NotificationKind::Error)
    }

    /// Remove a banner now, cancelling its timers
    pub fn dismiss(&self, id: &str) -> bool {
        if let Some(handle) = self.inner.timers.lock().remove(id) {
            handle.abort();
        }
        self.inner.remove(id)
    }

    /// Cancel every timer, drop every banner and every listener
    pub fn teardown(&self) {
        let handles: Vec<JoinHandle<()>> =
            self.inner.timers.lock().drain().map(|(_, h)| h).collect();
        for handle in &handles {
            handle.abort();
        }
        self.inner.banners.lock().clear();
        self.inner.listeners.clear();
        tracing::debug!(cancelled = handles.len(), "Notification surface torn down");
    }

    /// Banners currently attached, oldest first
    pub fn banners(&self) -> Vec<Banner> {
        self.inner.banners.lock().clone()
    }

    /// Number of banners whose timers are still running
    pub fn pending_timers(&self) -> usize {
        self.inner.timers.lock().len()
    }

    pub fn listeners(&self) -> &Arc<Listeners<NotificationEvent>> {
        &self.inner.listeners
    }

    fn display_duration(&self, kind: NotificationKind) -> Duration {
        let ms = match kind {
            NotificationKind::Info => self.config.info_display_ms,
            NotificationKind::Success => self.config.success_display_ms,
            NotificationKind::Error => self.config.error_display_ms,
        };
        Duration::from_millis(ms)
    }
}

impl Default for NotificationCenter {
    fn default() -> Self {
        Self::new(NotificationConfig::default())
    }
}

impl Drop for NotificationCenter {
    fn drop(&mut self) {
        for (_, handle) in self.inner.timers.lock().drain() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn settle() {
        for _ in 0..5 {
            tokio::task::yield_now().await;
        }
    }

    async fn advance(ms: u64) {
        // timer tasks must register their sleeps before the clock moves
        settle().await;
        tokio::time::advance(Duration::from_millis(ms)).await;
        settle().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_banner_lifecycle() {
        let center = NotificationCenter::default();
        let events = Arc::new(Mutex::new(Vec::new()));
        let events_clone = events.clone();
        center.listeners().subscribe(move |e| events_clone.lock().push(e.clone()));

        let id = center.error("Failed to send message. Please try again.");
        assert_eq!(center.banners()[0].phase, BannerPhase::Entering);

        advance(100).await;
        assert_eq!(center.banners()[0].phase, BannerPhase::Visible);

        advance(5_000).await;
        assert_eq!(center.banners()[0].phase, BannerPhase::Leaving);

        advance(300).await;
        assert!(center.banners().is_empty());
        assert_eq!(center.pending_timers(), 0);

        let events = events.lock();
        assert_eq!(events.len(), 4);
        assert!(matches!(&events[0], NotificationEvent::Added(b) if b.id == id));
        assert_eq!(events[3], NotificationEvent::Removed { id });
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_uses_shorter_display() {
        let center = NotificationCenter::default();
        center.success("Tools updated successfully");

        advance(100 + 3_000 + 300).await;
        assert!(center.banners().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_banners_stack_independently() {
        let center = NotificationCenter::default();
        center.error("first");
        advance(1_000).await;
        center.success("second");

        assert_eq!(center.banners().len(), 2);

        // second is removed at 1_000 + 3_400, first at 5_400
        advance(3_400).await;
        let remaining = center.banners();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].message, "first");

        advance(1_000).await;
        assert!(center.banners().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dismiss_cancels_timer() {
        let center = NotificationCenter::default();
        let id = center.info("hello");
        assert_eq!(center.pending_timers(), 1);

        assert!(center.dismiss(&id));
        assert!(center.banners().is_empty());
        assert_eq!(center.pending_timers(), 0);
        assert!(!center.dismiss(&id));
    }

    #[tokio::test(start_paused = true)]
    async fn test_teardown_cancels_everything() {
        let center = NotificationCenter::default();
        center.error("a");
        center.error("b");
        center.listeners().subscribe(|_| {});

        center.teardown();
        assert!(center.banners().is_empty());
        assert_eq!(center.pending_timers(), 0);
        assert!(center.listeners().is_empty());

        advance(10_000).await;
        assert!(center.banners().is_empty());
    }

    #[test]
    fn test_notify_without_runtime() {
        let center = NotificationCenter::default();
        let id = center.error("offline");
        let banners = center.banners();
        assert_eq!(banners[0].phase, BannerPhase::Visible);
        assert!(center.dismiss(&id));
    }
}
