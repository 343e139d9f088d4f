//! Host editor collaborators.
//!
//! The orchestration layer never touches UI directly. Progress, the user
//! visible activity log and document focus are injected through these traits.

use async_trait::async_trait;
use url::Url;

use crate::Result;

/// Receives progress updates for one long running command.
pub trait ProgressSink: Send + Sync {
	/// Reports `message`, advancing the bar by `increment` percent when given.
	fn report(&self, message: &str, increment: Option<f64>);
}

/// Severity of an [`ActivityLog`] record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
	/// Normal progress and outcomes.
	Info,
	/// Failures.
	Error,
}

/// A user visible log line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
	/// Severity.
	pub level: LogLevel,
	/// Document the record is about, if any.
	pub path: Option<String>,
	/// Message text.
	pub message: String,
	/// Rendered error, for failures.
	pub error: Option<String>,
}

impl LogRecord {
	/// Creates an info record.
	pub fn info(message: impl Into<String>) -> Self {
		Self {
			level: LogLevel::Info,
			path: None,
			message: message.into(),
			error: None,
		}
	}

	/// Creates an error record carrying `error`.
	pub fn error(message: impl Into<String>, error: &dyn std::error::Error) -> Self {
		Self {
			level: LogLevel::Error,
			path: None,
			message: message.into(),
			error: Some(error.to_string()),
		}
	}

	/// Attaches the document path.
	#[must_use]
	pub fn with_path(mut self, path: impl Into<String>) -> Self {
		self.path = Some(path.into());
		self
	}
}

/// User visible activity log, typically an output panel.
pub trait ActivityLog: Send + Sync {
	/// Appends one record.
	fn record(&self, record: LogRecord);
}

/// [`ActivityLog`] that forwards records to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingActivityLog;

impl ActivityLog for TracingActivityLog {
	fn record(&self, record: LogRecord) {
		let path = record.path.as_deref().unwrap_or_default();
		match record.level {
			LogLevel::Info => tracing::info!(path, "{}", record.message),
			LogLevel::Error => {
				let error = record.error.as_deref().unwrap_or_default();
				tracing::error!(path, error, "{}", record.message);
			}
		}
	}
}

/// Brings a document to the front before it is edited.
#[async_trait]
pub trait DocumentFocus: Send + Sync {
	/// Opens `document` in a non-preview editor and focuses it.
	async fn show_document(&self, document: &Url) -> Result<()>;
}

/// [`DocumentFocus`] for headless hosts with nothing to show.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoFocus;

#[async_trait]
impl DocumentFocus for NoFocus {
	async fn show_document(&self, _document: &Url) -> Result<()> {
		Ok(())
	}
}

/// Renders a document URL for log output, preferring the file system path.
pub fn display_path(document: &Url) -> String {
	match document.to_file_path() {
		Ok(path) => path.display().to_string(),
		Err(()) => document.to_string(),
	}
}

/// Pluralization suffix for `count`.
pub(crate) fn plural(count: usize) -> &'static str {
	if count == 1 { "" } else { "s" }
}
