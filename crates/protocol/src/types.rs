use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Opaque identifier of a suggestion, valid only for the document state it was fetched from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SuggestionId(String);

impl SuggestionId {
	/// Wraps a raw identifier.
	pub fn new(id: impl Into<String>) -> Self {
		Self(id.into())
	}

	/// Returns the raw identifier.
	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for SuggestionId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

/// Safety classification computed by the service.
///
/// Only [`SafetyLevel::Safe`] suggestions may be applied without confirmation.
/// Every other level the service reports is carried verbatim in
/// [`SafetyLevel::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SafetyLevel {
	/// `"SAFE"` on the wire.
	Safe,
	/// Any other level.
	Other(String),
}

impl SafetyLevel {
	/// Returns true for [`SafetyLevel::Safe`].
	pub fn is_safe(&self) -> bool {
		matches!(self, Self::Safe)
	}
}

impl From<String> for SafetyLevel {
	fn from(level: String) -> Self {
		if level == "SAFE" { Self::Safe } else { Self::Other(level) }
	}
}

impl From<SafetyLevel> for String {
	fn from(level: SafetyLevel) -> Self {
		match level {
			SafetyLevel::Safe => "SAFE".into(),
			SafetyLevel::Other(level) => level,
		}
	}
}

/// A proposed, service-classified edit on one document.
///
/// Line numbers shift as other suggestions land, so values are never reused
/// across queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
	/// Identifier passed back when triggering the apply.
	pub id: SuggestionId,
	/// Line the suggestion starts on.
	pub suggestion_line: u32,
	/// Safety classification.
	pub safety_level: SafetyLevel,
	/// Human readable description of the transform.
	pub action_label: String,
}

impl Suggestion {
	/// Returns true when the suggestion may be applied unattended.
	pub fn is_safe(&self) -> bool {
		self.safety_level.is_safe()
	}
}

/// How the service should apply a triggered suggestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ApplyMode {
	/// Batch mode used while sweeping every safe suggestion of a document.
	ApplyAllSafeSuggestions,
}

/// Function boundary reported by `safefix/getFunctionElements`.
///
/// The shape is owned by the analysis engine and carried verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FunctionElement(pub JsonValue);

/// Code assist available at a selection, as reported by `safefix/getCodeAssists`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CodeAssist(pub JsonValue);

/// Edit description of one code assist, as reported by `safefix/getCodeAssistAction`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CodeAssistAction(pub JsonValue);

/// Change of a project configuration file, forwarded with `safefix/setConfigurationFileContent`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigurationFileChange(pub JsonValue);

/// JSON-RPC request id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
	/// Numeric id.
	Number(i32),
	/// String id.
	String(String),
}

/// An untyped JSON-RPC request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnyRequest {
	/// Request id, unique per connection.
	pub id: RequestId,
	/// Method name.
	pub method: String,
	/// Encoded parameters.
	#[serde(default)]
	pub params: JsonValue,
}

/// An untyped JSON-RPC response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnyResponse {
	/// Id of the request this answers.
	pub id: RequestId,
	/// Encoded result on success.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub result: Option<JsonValue>,
	/// Error on failure.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub error: Option<ResponseError>,
}

/// An untyped JSON-RPC notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnyNotification {
	/// Method name.
	pub method: String,
	/// Encoded parameters.
	#[serde(default)]
	pub params: JsonValue,
}

/// Error object carried by a failed response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
#[error("{message} (code {code})")]
pub struct ResponseError {
	/// JSON-RPC error code.
	pub code: i32,
	/// Error message.
	pub message: String,
	/// Optional structured payload.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub data: Option<JsonValue>,
}

impl ResponseError {
	/// `MethodNotFound` as defined by JSON-RPC.
	pub const METHOD_NOT_FOUND: i32 = -32601;
	/// `InvalidParams` as defined by JSON-RPC.
	pub const INVALID_PARAMS: i32 = -32602;

	/// Creates an error without payload.
	pub fn new(code: i32, message: impl fmt::Display) -> Self {
		Self {
			code,
			message: message.to_string(),
			data: None,
		}
	}
}
