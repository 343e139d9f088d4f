//! Tracks the document a suggestion view is showing.

use std::sync::Arc;

use parking_lot::Mutex;
use safefix_protocol::{FunctionElement, Suggestion, SuggestionId, SuggestionService};
use tokio::sync::watch;
use url::Url;

use crate::Result;
use crate::bus::{NotificationBus, Subscription};

struct WatchState {
	current: Mutex<Option<Url>>,
	changes: watch::Sender<u64>,
}

impl WatchState {
	fn bump(&self) {
		self.changes.send_modify(|generation| *generation = generation.wrapping_add(1));
	}
}

/// Follows one "current" document and signals when its suggestions may have changed.
///
/// Receivers from [`subscribe`](Self::subscribe) observe a generation counter
/// that advances when a different document is selected or the service
/// reports an update for the current one.
pub struct DocumentWatcher {
	service: Arc<dyn SuggestionService>,
	state: Arc<WatchState>,
	_subscription: Subscription,
}

impl std::fmt::Debug for DocumentWatcher {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("DocumentWatcher")
			.field("current", &*self.state.current.lock())
			.field("generation", &*self.state.changes.borrow())
			.finish_non_exhaustive()
	}
}

impl DocumentWatcher {
	/// Creates a watcher with no current document.
	pub fn new(service: Arc<dyn SuggestionService>, bus: &NotificationBus) -> Self {
		let (changes, _) = watch::channel(0);
		let state = Arc::new(WatchState {
			current: Mutex::new(None),
			changes,
		});

		let listener_state = Arc::clone(&state);
		let subscription = bus.subscribe_fn(move |document| {
			let matches = listener_state.current.lock().as_ref() == Some(document);
			if matches {
				listener_state.bump();
			}
		});

		Self {
			service,
			state,
			_subscription: subscription,
		}
	}

	/// The current document.
	pub fn document(&self) -> Option<Url> {
		self.state.current.lock().clone()
	}

	/// Switches the current document. Selecting the same document again is a no-op.
	pub fn set_document(&self, document: Option<Url>) {
		{
			let mut current = self.state.current.lock();
			if *current == document {
				return;
			}
			*current = document;
		}
		self.state.bump();
	}

	/// Receiver of the change generation.
	pub fn subscribe(&self) -> watch::Receiver<u64> {
		self.state.changes.subscribe()
	}

	/// Suggestions for the current document, `None` without one.
	pub async fn suggestions(&self) -> Result<Option<Vec<Suggestion>>> {
		let Some(document) = self.document() else {
			return Ok(None);
		};
		Ok(self.service.suggestions(&document).await?)
	}

	/// Function boundaries of the current document, `None` without one.
	pub async fn function_elements(&self) -> Result<Option<Vec<FunctionElement>>> {
		let Some(document) = self.document() else {
			return Ok(None);
		};
		Ok(self.service.function_elements(&document).await?)
	}

	/// Diff preview of one suggestion in the current document.
	pub async fn code_assist_diff(&self, suggestion: &SuggestionId, context_lines: Option<u32>) -> Result<Option<String>> {
		let Some(document) = self.document() else {
			return Ok(None);
		};
		Ok(self
			.service
			.code_assist_diff(&document, suggestion, context_lines)
			.await?)
	}
}
