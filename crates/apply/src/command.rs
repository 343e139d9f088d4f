//! User facing flows: sweep safe suggestions, open scan results.

use std::fmt;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use safefix_protocol::SuggestionService;
use tokio_util::sync::CancellationToken;

use crate::batch::{BatchRunner, BatchSummary};
use crate::bus::NotificationBus;
use crate::config::ApplyConfig;
use crate::host::{ActivityLog, DocumentFocus, LogRecord, ProgressSink};
use crate::resolve::{ScanTarget, ScanTargetResolver};
use crate::session::SafeApplier;

/// Entry points bound to one service connection.
pub struct Commands {
	resolver: ScanTargetResolver,
	applier: SafeApplier,
	log: Arc<dyn ActivityLog>,
}

impl fmt::Debug for Commands {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Commands")
			.field("resolver", &self.resolver)
			.field("applier", &self.applier)
			.finish_non_exhaustive()
	}
}

impl Commands {
	/// Wires the resolver and applier for one connection.
	pub fn new(
		config: &ApplyConfig,
		service: Arc<dyn SuggestionService>,
		bus: NotificationBus,
		focus: Arc<dyn DocumentFocus>,
		log: Arc<dyn ActivityLog>,
	) -> Self {
		Self {
			resolver: ScanTargetResolver::new(config, log.clone()),
			applier: SafeApplier::new(service, bus, focus, log.clone()),
			log,
		}
	}

	/// Applies every safe suggestion in the files under `inputs`, one document at a time.
	pub async fn apply_all_safe_suggestions(
		&self,
		inputs: &[PathBuf],
		progress: &dyn ProgressSink,
		cancel: &CancellationToken,
	) -> BatchSummary {
		const CANCELLED: &str = "Applying safe suggestions cancelled.";

		if inputs.is_empty() {
			self.log
				.record(LogRecord::info("No file selected to apply safe suggestions."));
			return BatchSummary::default();
		}

		progress.report("Collecting files to apply safe suggestions", None);
		let Some(targets) = self
			.collect(inputs, cancel, CANCELLED, "No supported files found to apply safe suggestions.")
			.await
		else {
			return BatchSummary {
				cancelled: cancel.is_cancelled(),
				..BatchSummary::default()
			};
		};

		let applier = &self.applier;
		let summary = BatchRunner::new("Applying safe suggestions", progress, self.log.as_ref())
			.run_all(
				targets,
				|target| async move { applier.run(target.uri(), cancel).await.applied },
				cancel,
			)
			.await;

		if summary.cancelled {
			self.log.record(LogRecord::info(CANCELLED));
		}
		summary
	}

	/// Opens a scan result view for each file under `inputs`.
	pub async fn scan_files<F, Fut>(
		&self,
		inputs: &[PathBuf],
		mut open_scan_result: F,
		progress: &dyn ProgressSink,
		cancel: &CancellationToken,
	) -> BatchSummary
	where
		F: FnMut(ScanTarget) -> Fut,
		Fut: Future<Output = ()>,
	{
		const CANCELLED: &str = "Scan cancelled.";

		let Some(targets) = self
			.collect(inputs, cancel, CANCELLED, "No supported files found to scan.")
			.await
		else {
			return BatchSummary {
				cancelled: cancel.is_cancelled(),
				..BatchSummary::default()
			};
		};

		let total = targets.len();
		let summary = BatchRunner::new("Opening scan results", progress, self.log.as_ref())
			.without_summary()
			.run_all(
				targets,
				|target| {
					let opened = open_scan_result(target);
					async move {
						opened.await;
						0
					}
				},
				cancel,
			)
			.await;

		// A cancel after the last result opened stopped nothing.
		if summary.processed < total {
			self.log.record(LogRecord::info(CANCELLED));
		}
		summary
	}

	/// Resolves targets, logging why there is nothing to do when that is the case.
	async fn collect(
		&self,
		inputs: &[PathBuf],
		cancel: &CancellationToken,
		cancelled: &str,
		empty: &str,
	) -> Option<Vec<ScanTarget>> {
		let targets = self.resolver.resolve(inputs, cancel).await;

		if cancel.is_cancelled() {
			self.log.record(LogRecord::info(cancelled));
			return None;
		}
		if targets.is_empty() {
			self.log.record(LogRecord::info(empty));
			return None;
		}
		Some(targets)
	}
}
