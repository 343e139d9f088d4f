//! Unattended application of safe suggestions.
//!
//! The suggestion service classifies candidate edits and applies them on
//! request, but only reports that an edit landed through an out-of-band
//! `documentUpdated` message. This crate sequences those applies:
//!
//! - [`bus::NotificationBus`] fans `documentUpdated` events out to waiters.
//! - [`resolve::ScanTargetResolver`] expands user supplied files and
//!   directories into a deduplicated list of eligible documents.
//! - [`session::SafeApplier`] runs the per-document apply state machine.
//! - [`batch::BatchRunner`] drives sessions across many documents.
//!
//! [`command::Commands`] ties them together into the user facing flows.
//!
//! ```text
//! ┌──────────┐  targets  ┌─────────────┐  run(doc)  ┌────────────┐  query/apply  ┌─────────┐
//! │ Resolver │──────────▶│ BatchRunner │───────────▶│ SafeApplier│──────────────▶│ Service │
//! └──────────┘           └─────────────┘            └────────────┘               └─────────┘
//!                                                          ▲  documentUpdated         │
//!                                                          └───── NotificationBus ◀───┘
//! ```
#![warn(missing_docs)]

use std::io;
use std::path::PathBuf;

pub mod batch;
pub mod bus;
pub mod command;
pub mod config;
pub mod connection;
pub mod host;
pub mod resolve;
pub mod session;
pub mod watcher;

#[cfg(test)]
mod testing;

pub use batch::{BatchRunner, BatchSummary};
pub use bus::{DocumentUpdatedListener, ListenerError, NotificationBus, Subscription};
pub use command::Commands;
pub use config::ApplyConfig;
pub use host::{ActivityLog, DocumentFocus, LogLevel, LogRecord, ProgressSink, TracingActivityLog};
pub use resolve::{ScanTarget, ScanTargetResolver};
pub use session::{SafeApplier, SessionOutcome, SessionReport};
pub use watcher::DocumentWatcher;

/// A convenient type alias for `Result` with `E` = [`enum@crate::Error`].
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Possible errors.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
	/// A request to the suggestion service failed.
	#[error(transparent)]
	Service(#[from] safefix_protocol::Error),
	/// A scan input could not be read.
	#[error("{}: {source}", path.display())]
	Io {
		/// The offending input.
		path: PathBuf,
		/// Underlying error.
		#[source]
		source: io::Error,
	},
	/// A blocking directory walk did not complete.
	#[error("walk task failed: {0}")]
	Join(#[from] tokio::task::JoinError),
	/// A path that cannot be expressed as a `file:` URL.
	#[error("not addressable as a file url: {0}")]
	InvalidTarget(String),
	/// Configuration could not be parsed.
	#[error("invalid configuration: {0}")]
	Config(#[from] toml::de::Error),
	/// A host collaborator failed.
	#[error("{0}")]
	Host(String),
}

impl Error {
	pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(io::Error) -> Self {
		let path = path.into();
		move |source| Self::Io { path, source }
	}
}
