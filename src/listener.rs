//! Listener registry — the observer contract every panel exposes
//!
//! Panels emit typed change events; renderers register callbacks or take an
//! async stream. Every registration has an explicit teardown path:
//! `unsubscribe` by id, `clear` for the whole registry, or dropping the
//! [`EventStream`].

use futures::Stream;
use parking_lot::RwLock;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

/// Handle returned by [`Listeners::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Callback<E> = Arc<dyn Fn(&E) + Send + Sync>;

/// Registered callbacks for one panel's events
pub struct Listeners<E> {
    next_id: AtomicU64,
    entries: RwLock<Vec<(ListenerId, Callback<E>)>>,
}

impl<E> Default for Listeners<E> {
    fn default() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            entries: RwLock::new(Vec::new()),
        }
    }
}

impl<E> Listeners<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback; it runs synchronously on every emit
    pub fn subscribe(&self, callback: impl Fn(&E) + Send + Sync + 'static) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.entries.write().push((id, Arc::new(callback)));
        id
    }

    /// Remove a callback. Returns false if it was already gone.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|(entry_id, _)| *entry_id != id);
        entries.len() != before
    }

    /// Drop every registered callback
    pub fn clear(&self) {
        self.entries.write().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Deliver an event to every callback
    ///
    /// Callbacks are snapshotted first, so a callback may subscribe or
    /// unsubscribe without deadlocking.
    pub fn emit(&self, event: &E) {
        let callbacks: Vec<Callback<E>> = self
            .entries
            .read()
            .iter()
            .map(|(_, cb)| Arc::clone(cb))
            .collect();
        for callback in callbacks {
            callback(event);
        }
    }
}

impl<E: Clone + Send + 'static> Listeners<E> {
    /// Receive events as an async stream
    ///
    /// The stream unsubscribes itself when dropped.
    pub fn stream(self: &Arc<Self>) -> EventStream<E> {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = self.subscribe(move |event: &E| {
            let _ = tx.send(event.clone());
        });
        EventStream {
            inner: UnboundedReceiverStream::new(rx),
            registry: Arc::downgrade(self),
            id,
        }
    }
}

/// Async stream of panel events, see [`Listeners::stream`]
pub struct EventStream<E> {
    inner: UnboundedReceiverStream<E>,
    registry: Weak<Listeners<E>>,
    id: ListenerId,
}

impl<E> Stream for EventStream<E> {
    type Item = E;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<E>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}

impl<E> Drop for EventStream<E> {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.unsubscribe(self.id);
        }
    }
}
