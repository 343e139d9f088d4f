//! Sequential driver across many documents.

use std::future::Future;

use tokio_util::sync::CancellationToken;

use crate::host::{ActivityLog, LogRecord, ProgressSink, plural};
use crate::resolve::ScanTarget;

/// Totals of one [`BatchRunner::run_all`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
	/// Targets that were started.
	pub processed: usize,
	/// Sum of the per-document results.
	pub applied_total: usize,
	/// Cancellation was requested before the batch ended.
	pub cancelled: bool,
}

/// Runs one per-document action after another, reporting progress.
///
/// Documents are never processed concurrently, so at most one editor is
/// being driven at any time.
pub struct BatchRunner<'a> {
	label: &'a str,
	progress: &'a dyn ProgressSink,
	log: &'a dyn ActivityLog,
	summarize: bool,
}

impl<'a> BatchRunner<'a> {
	/// Creates a runner whose progress messages read `"{label} (n/total)"`.
	pub fn new(label: &'a str, progress: &'a dyn ProgressSink, log: &'a dyn ActivityLog) -> Self {
		Self {
			label,
			progress,
			log,
			summarize: true,
		}
	}

	/// Skips the closing "Applied N suggestions across M files." line.
	#[must_use]
	pub fn without_summary(mut self) -> Self {
		self.summarize = false;
		self
	}

	/// Runs `per_document` for each target in order.
	///
	/// Cancellation is checked before each target; unreached targets are
	/// never started. Each finished target advances progress by
	/// `100 / total` percent.
	pub async fn run_all<F, Fut>(&self, targets: Vec<ScanTarget>, mut per_document: F, cancel: &CancellationToken) -> BatchSummary
	where
		F: FnMut(ScanTarget) -> Fut,
		Fut: Future<Output = usize>,
	{
		let total = targets.len();
		let mut summary = BatchSummary::default();

		for target in targets {
			if cancel.is_cancelled() {
				break;
			}

			tracing::debug!(document = %target, index = summary.processed, total, "batch.target");
			summary.applied_total += per_document(target).await;
			summary.processed += 1;

			self.progress.report(
				&format!("{} ({}/{})", self.label, summary.processed, total),
				Some(100.0 / total as f64),
			);
		}

		summary.cancelled = cancel.is_cancelled();
		tracing::info!(
			processed = summary.processed,
			applied = summary.applied_total,
			total,
			cancelled = summary.cancelled,
			"batch.done"
		);

		if self.summarize && !summary.cancelled && summary.processed > 1 {
			self.log.record(LogRecord::info(format!(
				"Applied {} safe suggestion{} across {} file{}.",
				summary.applied_total,
				plural(summary.applied_total),
				summary.processed,
				plural(summary.processed),
			)));
		}

		summary
	}
}
