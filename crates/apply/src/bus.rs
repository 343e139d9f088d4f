//! Fan-out relay for `documentUpdated` events.
//!
//! One bus exists per service connection. The connection router publishes
//! every `documentUpdated` message into it and any number of listeners
//! (apply sessions, the document watcher) observe them.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use async_trait::async_trait;
use indexmap::IndexMap;
use parking_lot::Mutex;
use url::Url;

/// Error type listeners may return; it is logged and otherwise ignored.
pub type ListenerError = Box<dyn std::error::Error + Send + Sync>;

/// Receives `documentUpdated` events from a [`NotificationBus`].
#[async_trait]
pub trait DocumentUpdatedListener: Send + Sync {
	/// Called once per published event.
	async fn on_document_updated(&self, document: &Url) -> Result<(), ListenerError>;
}

struct FnListener<F>(F);

#[async_trait]
impl<F> DocumentUpdatedListener for FnListener<F>
where
	F: Fn(&Url) + Send + Sync,
{
	async fn on_document_updated(&self, document: &Url) -> Result<(), ListenerError> {
		(self.0)(document);
		Ok(())
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct ListenerId(u64);

#[derive(Default)]
struct Registry {
	next_id: AtomicU64,
	listeners: Mutex<IndexMap<ListenerId, Arc<dyn DocumentUpdatedListener>>>,
}

impl Registry {
	fn remove(&self, id: ListenerId) {
		self.listeners.lock().shift_remove(&id);
	}

	fn contains(&self, id: ListenerId) -> bool {
		self.listeners.lock().contains_key(&id)
	}
}

/// Multi-consumer relay of `documentUpdated` events.
///
/// Cloning yields another handle to the same listener registry.
#[derive(Clone, Default)]
pub struct NotificationBus {
	registry: Arc<Registry>,
}

impl fmt::Debug for NotificationBus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("NotificationBus")
			.field("listeners", &self.listener_count())
			.finish()
	}
}

impl NotificationBus {
	/// Creates a bus without listeners.
	pub fn new() -> Self {
		Self::default()
	}

	/// Registers `listener` until the returned [`Subscription`] is dropped or disposed.
	#[must_use = "dropping the subscription unregisters the listener"]
	pub fn subscribe(&self, listener: Arc<dyn DocumentUpdatedListener>) -> Subscription {
		let id = ListenerId(self.registry.next_id.fetch_add(1, Ordering::Relaxed));
		self.registry.listeners.lock().insert(id, listener);
		Subscription {
			id,
			registry: Arc::downgrade(&self.registry),
		}
	}

	/// Registers a synchronous callback.
	#[must_use = "dropping the subscription unregisters the listener"]
	pub fn subscribe_fn(&self, callback: impl Fn(&Url) + Send + Sync + 'static) -> Subscription {
		self.subscribe(Arc::new(FnListener(callback)))
	}

	/// Delivers `document` to every registered listener, one after another.
	///
	/// Returns once each listener's future has completed. Listeners removed
	/// while the publish is in progress are skipped if not yet reached;
	/// listeners added meanwhile first see the next publish. A failing
	/// listener does not stop delivery to the rest.
	pub async fn publish(&self, document: &Url) {
		let snapshot: Vec<_> = self
			.registry
			.listeners
			.lock()
			.iter()
			.map(|(id, listener)| (*id, Arc::clone(listener)))
			.collect();

		for (id, listener) in snapshot {
			if !self.registry.contains(id) {
				continue;
			}
			if let Err(error) = listener.on_document_updated(document).await {
				tracing::warn!(uri = document.as_str(), listener = id.0, %error, "bus.listener.failed");
			}
		}
	}

	/// Number of registered listeners.
	pub fn listener_count(&self) -> usize {
		self.registry.listeners.lock().len()
	}
}

/// Registration handle returned by [`NotificationBus::subscribe`].
///
/// Unregisters on drop. Safe to drop from inside the listener's own callback.
pub struct Subscription {
	id: ListenerId,
	registry: Weak<Registry>,
}

impl fmt::Debug for Subscription {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Subscription").field("id", &self.id.0).finish()
	}
}

impl Subscription {
	/// Unregisters the listener now.
	pub fn dispose(self) {}
}

impl Drop for Subscription {
	fn drop(&mut self) {
		if let Some(registry) = self.registry.upgrade() {
			registry.remove(self.id);
		}
	}
}
