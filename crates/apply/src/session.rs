//! Per-document apply state machine.
//!
//! A session repeatedly fetches the document's suggestions, triggers the
//! first safe one and then suspends until the service confirms the edit with
//! a `documentUpdated` event for the same document:
//!
//! ```text
//!            ┌──────────── documentUpdated ────────────┐
//!            ▼                                         │
//!         ┌──────┐   step    ┌──────────┐  applied  ┌──┴───┐
//! start ─▶│ Idle │──────────▶│ Applying │──────────▶│ Idle │
//!         └──────┘           └────┬─────┘           └──┬───┘
//!                                 │ exhausted /        │ cancelled
//!                                 │ cancelled / error  ▼
//!                                 └─────────────▶ ┌──────────┐
//!                                                 │ Finished │
//!                                                 └──────────┘
//! ```
//!
//! The suspension has no timeout. A service that never confirms an apply
//! stalls the session until it is cancelled.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use safefix_protocol::{ApplyMode, Suggestion, SuggestionService};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::bus::{DocumentUpdatedListener, ListenerError, NotificationBus, Subscription};
use crate::host::{ActivityLog, DocumentFocus, LogRecord, display_path};
use crate::{Error, Result};

/// How a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
	/// No safe suggestion was left.
	Completed,
	/// Cancellation was observed at a poll point.
	Cancelled,
	/// A service or host call failed; nothing further was applied.
	Failed,
}

/// Result of one [`SafeApplier::run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionReport {
	/// Suggestions successfully triggered.
	pub applied: usize,
	/// Terminal state.
	pub outcome: SessionOutcome,
}

/// Selects the safe suggestion with the lowest line.
///
/// Ties go to the suggestion listed first. Non-safe suggestions are never
/// returned.
pub fn next_safe_suggestion(suggestions: &[Suggestion]) -> Option<&Suggestion> {
	suggestions
		.iter()
		.filter(|suggestion| suggestion.is_safe())
		.min_by_key(|suggestion| suggestion.suggestion_line)
}

/// Runs apply sessions against one service connection.
pub struct SafeApplier {
	service: Arc<dyn SuggestionService>,
	bus: NotificationBus,
	focus: Arc<dyn DocumentFocus>,
	log: Arc<dyn ActivityLog>,
}

impl fmt::Debug for SafeApplier {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("SafeApplier").field("bus", &self.bus).finish_non_exhaustive()
	}
}

impl SafeApplier {
	/// Creates an applier. `bus` must be the one the connection publishes `documentUpdated` into.
	pub fn new(
		service: Arc<dyn SuggestionService>,
		bus: NotificationBus,
		focus: Arc<dyn DocumentFocus>,
		log: Arc<dyn ActivityLog>,
	) -> Self {
		Self {
			service,
			bus,
			focus,
			log,
		}
	}

	/// Applies every safe suggestion of `document`, one at a time.
	///
	/// Failures are logged and end the session; they are never returned.
	pub async fn run(&self, document: &Url, cancel: &CancellationToken) -> SessionReport {
		let mut session = ApplySession::open(document, &self.bus);
		tracing::info!(uri = document.as_str(), "apply.start");
		self.log
			.record(LogRecord::info("Start applying safe suggestions.").with_path(session.path.clone()));

		let finish = loop {
			match self.step(&mut session, cancel).await {
				Ok(Step::Applied) => {}
				Ok(Step::Exhausted) => break Finish::Completed,
				Ok(Step::Cancelled) => break Finish::Cancelled,
				Err(error) => break Finish::Failed(error),
			}

			match session.next_trigger(cancel).await {
				Trigger::Updated => {}
				Trigger::Cancelled => break Finish::Cancelled,
				Trigger::Closed => {
					tracing::debug!(uri = document.as_str(), "apply.bus_closed");
					break Finish::Completed;
				}
			}
		};

		self.finish(session, finish)
	}

	async fn step(&self, session: &mut ApplySession, cancel: &CancellationToken) -> Result<Step> {
		if cancel.is_cancelled() {
			return Ok(Step::Cancelled);
		}

		session.begin_step();
		let step = self.apply_next(session, cancel).await;
		session.end_step();
		step
	}

	async fn apply_next(&self, session: &mut ApplySession, cancel: &CancellationToken) -> Result<Step> {
		let suggestions = self.service.suggestions(&session.document).await?;
		let Some(next) = next_safe_suggestion(suggestions.as_deref().unwrap_or_default()) else {
			return Ok(Step::Exhausted);
		};
		if cancel.is_cancelled() {
			return Ok(Step::Cancelled);
		}

		self.focus.show_document(&session.document).await?;
		if cancel.is_cancelled() {
			return Ok(Step::Cancelled);
		}

		// Only confirmations sent after the trigger may resume the session.
		session.discard_pending();
		self.service
			.trigger_apply(&next.id, ApplyMode::ApplyAllSafeSuggestions)
			.await?;
		session.applied += 1;

		tracing::debug!(
			uri = session.document.as_str(),
			suggestion = %next.id,
			line = next.suggestion_line,
			applied = session.applied,
			"apply.triggered"
		);
		self.log.record(
			LogRecord::info(format!("Line {}: {}", next.suggestion_line, next.action_label))
				.with_path(session.path.clone()),
		);
		Ok(Step::Applied)
	}

	/// Consumes the session, so it can end only once.
	fn finish(&self, mut session: ApplySession, finish: Finish) -> SessionReport {
		session.state = SessionState::Finished;
		drop(session.subscription.take());

		let outcome = finish.outcome();
		tracing::info!(
			uri = session.document.as_str(),
			applied = session.applied,
			?outcome,
			"apply.finish"
		);

		let record = match &finish {
			Finish::Completed => LogRecord::info("Finished applying safe suggestions."),
			Finish::Cancelled => LogRecord::info("Cancelled applying safe suggestions."),
			Finish::Failed(error) => LogRecord::error("Applying suggestions failed", error),
		};
		self.log.record(record.with_path(session.path));

		SessionReport {
			applied: session.applied,
			outcome,
		}
	}
}

enum Step {
	Applied,
	Exhausted,
	Cancelled,
}

enum Trigger {
	Updated,
	Cancelled,
	Closed,
}

enum Finish {
	Completed,
	Cancelled,
	Failed(Error),
}

impl Finish {
	fn outcome(&self) -> SessionOutcome {
		match self {
			Self::Completed => SessionOutcome::Completed,
			Self::Cancelled => SessionOutcome::Cancelled,
			Self::Failed(_) => SessionOutcome::Failed,
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionState {
	Idle,
	Applying,
	Finished,
}

/// Forwards `documentUpdated` events for one document into the session queue.
struct UpdateListener {
	document: String,
	tx: mpsc::UnboundedSender<()>,
}

#[async_trait]
impl DocumentUpdatedListener for UpdateListener {
	async fn on_document_updated(&self, document: &Url) -> Result<(), ListenerError> {
		if document.as_str() == self.document {
			// The receiver is gone once the session finished.
			let _ = self.tx.send(());
		}
		Ok(())
	}
}

struct ApplySession {
	document: Url,
	path: String,
	applied: usize,
	state: SessionState,
	/// Confirmations not yet consumed. Events arriving after the trigger stay queued.
	updates: mpsc::UnboundedReceiver<()>,
	subscription: Option<Subscription>,
}

impl ApplySession {
	fn open(document: &Url, bus: &NotificationBus) -> Self {
		let (tx, updates) = mpsc::unbounded_channel();
		let subscription = bus.subscribe(Arc::new(UpdateListener {
			document: document.as_str().to_owned(),
			tx,
		}));
		Self {
			document: document.clone(),
			path: display_path(document),
			applied: 0,
			state: SessionState::Idle,
			updates,
			subscription: Some(subscription),
		}
	}

	/// Enters `Applying`. Queued confirmations are dropped; the query that follows observes them.
	fn begin_step(&mut self) {
		debug_assert_eq!(self.state, SessionState::Idle, "overlapping apply step");
		self.state = SessionState::Applying;
		self.discard_pending();
	}

	/// Drops confirmations received so far.
	fn discard_pending(&mut self) {
		let mut coalesced = 0usize;
		while self.updates.try_recv().is_ok() {
			coalesced += 1;
		}
		if coalesced > 0 {
			tracing::trace!(uri = self.document.as_str(), coalesced, "apply.coalesced");
		}
	}

	fn end_step(&mut self) {
		debug_assert_eq!(self.state, SessionState::Applying);
		self.state = SessionState::Idle;
	}

	/// Waits for the next confirmation for this document, or cancellation.
	async fn next_trigger(&mut self, cancel: &CancellationToken) -> Trigger {
		tokio::select! {
			biased;
			() = cancel.cancelled() => Trigger::Cancelled,
			update = self.updates.recv() => match update {
				Some(()) => Trigger::Updated,
				None => Trigger::Closed,
			},
		}
	}
}
