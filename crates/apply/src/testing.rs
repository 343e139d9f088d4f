//! Test doubles shared across module tests.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use safefix_protocol::{ApplyMode, FunctionElement, SafetyLevel, Suggestion, SuggestionId, SuggestionService};
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::bus::NotificationBus;
use crate::host::{ActivityLog, LogRecord, ProgressSink};

#[derive(Default)]
pub(crate) struct RecordingLog {
	records: Mutex<Vec<LogRecord>>,
}

impl RecordingLog {
	pub(crate) fn new() -> Arc<Self> {
		Arc::default()
	}

	pub(crate) fn records(&self) -> Vec<LogRecord> {
		self.records.lock().clone()
	}

	pub(crate) fn messages(&self) -> Vec<String> {
		self.records.lock().iter().map(|r| r.message.clone()).collect()
	}
}

impl ActivityLog for RecordingLog {
	fn record(&self, record: LogRecord) {
		self.records.lock().push(record);
	}
}

#[derive(Default)]
pub(crate) struct RecordingProgress {
	reports: Mutex<Vec<(String, Option<f64>)>>,
}

impl RecordingProgress {
	pub(crate) fn reports(&self) -> Vec<(String, Option<f64>)> {
		self.reports.lock().clone()
	}

	pub(crate) fn increments(&self) -> Vec<f64> {
		self.reports.lock().iter().filter_map(|(_, inc)| *inc).collect()
	}
}

impl ProgressSink for RecordingProgress {
	fn report(&self, message: &str, increment: Option<f64>) {
		self.reports.lock().push((message.to_owned(), increment));
	}
}

pub(crate) fn suggestion(id: &str, line: u32, safe: bool) -> Suggestion {
	Suggestion {
		id: SuggestionId::new(id),
		suggestion_line: line,
		safety_level: if safe { SafetyLevel::Safe } else { SafetyLevel::Other("INFORMATION".into()) },
		action_label: format!("Fix {id}"),
	}
}

/// What the fake service does once an apply was triggered.
#[derive(Clone, Copy, PartialEq, Eq)]
pub(crate) enum OnApply {
	/// Publish `documentUpdated` before `trigger_apply` returns.
	PublishInline,
	/// Never confirm; tests publish by hand.
	Silent,
}

/// In-memory suggestion service. Applying a suggestion removes it.
pub(crate) struct ScriptedService {
	documents: Mutex<HashMap<String, Vec<Suggestion>>>,
	bus: NotificationBus,
	on_apply: OnApply,
	pub(crate) queries: AtomicUsize,
	pub(crate) applied: Mutex<Vec<SuggestionId>>,
	pub(crate) apply_done: Notify,
	fail_queries: Mutex<bool>,
	cancel_after_applies: Mutex<Option<(usize, CancellationToken)>>,
}

impl ScriptedService {
	pub(crate) fn new(bus: &NotificationBus, on_apply: OnApply) -> Arc<Self> {
		Arc::new(Self {
			documents: Mutex::default(),
			bus: bus.clone(),
			on_apply,
			queries: AtomicUsize::new(0),
			applied: Mutex::default(),
			apply_done: Notify::new(),
			fail_queries: Mutex::new(false),
			cancel_after_applies: Mutex::new(None),
		})
	}

	pub(crate) fn with_document(self: Arc<Self>, document: &Url, suggestions: Vec<Suggestion>) -> Arc<Self> {
		self.documents.lock().insert(document.to_string(), suggestions);
		self
	}

	pub(crate) fn fail_queries(&self) {
		*self.fail_queries.lock() = true;
	}

	/// Fires `cancel` right after the `count`th apply returns.
	pub(crate) fn cancel_after(&self, count: usize, cancel: CancellationToken) {
		*self.cancel_after_applies.lock() = Some((count, cancel));
	}

	pub(crate) fn query_count(&self) -> usize {
		self.queries.load(Ordering::SeqCst)
	}

	pub(crate) fn applied_ids(&self) -> Vec<String> {
		self.applied.lock().iter().map(|id| id.to_string()).collect()
	}

	fn owner_of(&self, suggestion: &SuggestionId) -> Option<Url> {
		let mut documents = self.documents.lock();
		documents.iter_mut().find_map(|(uri, list)| {
			let index = list.iter().position(|s| &s.id == suggestion)?;
			list.remove(index);
			Url::parse(uri).ok()
		})
	}
}

#[async_trait]
impl SuggestionService for ScriptedService {
	async fn suggestions(&self, document: &Url) -> safefix_protocol::Result<Option<Vec<Suggestion>>> {
		self.queries.fetch_add(1, Ordering::SeqCst);
		if *self.fail_queries.lock() {
			return Err(safefix_protocol::Error::ServiceStopped);
		}
		Ok(self.documents.lock().get(document.as_str()).cloned())
	}

	/// One element per remaining suggestion, named after its id.
	async fn function_elements(&self, document: &Url) -> safefix_protocol::Result<Option<Vec<FunctionElement>>> {
		Ok(self.documents.lock().get(document.as_str()).map(|suggestions| {
			suggestions
				.iter()
				.map(|s| FunctionElement(serde_json::json!({ "name": s.id.as_str() })))
				.collect()
		}))
	}

	async fn trigger_apply(&self, suggestion: &SuggestionId, _mode: ApplyMode) -> safefix_protocol::Result<()> {
		let owner = self.owner_of(suggestion);
		let count = {
			let mut applied = self.applied.lock();
			applied.push(suggestion.clone());
			applied.len()
		};
		let cancel = self
			.cancel_after_applies
			.lock()
			.as_ref()
			.filter(|(after, _)| *after == count)
			.map(|(_, cancel)| cancel.clone());
		if let Some(cancel) = cancel {
			cancel.cancel();
		}
		self.apply_done.notify_one();
		if let (OnApply::PublishInline, Some(owner)) = (self.on_apply, owner) {
			self.bus.publish(&owner).await;
		}
		Ok(())
	}
}
