//! Client side of the suggestion service protocol.
//!
//! The suggestion service is a language server extension that detects
//! candidate code edits and classifies each one by safety. This crate owns
//! the data it exchanges with the editor-side orchestration:
//!
//! - [`Suggestion`] and friends, the values returned by `safefix/getSuggestions`.
//! - [`ext`], typed definitions of the extension requests and notifications.
//! - [`SuggestionService`], the request/response seam the orchestration layer
//!   consumes, and [`LspSuggestionService`], its implementation over a
//!   JSON-RPC [`ServiceTransport`].
//!
//! The transport itself (framing, process management) lives with the host.
#![warn(missing_docs)]

/// Re-export of the [`lsp_types`] dependency of this crate.
pub use lsp_types;
pub use serde_json::Value as JsonValue;
pub use url::Url;

pub mod ext;
mod service;
mod types;

pub use service::{LspSuggestionService, ServiceTransport, SuggestionService};
pub use types::{
	AnyNotification, AnyRequest, AnyResponse, ApplyMode, CodeAssist, CodeAssistAction, ConfigurationFileChange,
	FunctionElement, RequestId, ResponseError, SafetyLevel, Suggestion, SuggestionId,
};

/// A convenient type alias for `Result` with `E` = [`enum@crate::Error`].
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Possible errors.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
	/// The connection to the service is gone.
	#[error("service stopped")]
	ServiceStopped,
	/// Parameters could not be encoded, or the peer replied with an undecodable result.
	#[error("json error: {0}")]
	Json(#[from] serde_json::Error),
	/// The peer replied with an error.
	#[error("{0}")]
	Response(#[from] ResponseError),
	/// The peer violated the protocol.
	#[error("protocol error: {0}")]
	Protocol(String),
	/// No response arrived within the configured timeout.
	#[error("request timed out: {0}")]
	RequestTimeout(String),
}
