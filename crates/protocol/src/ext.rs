//! Suggestion service extensions to the Language Server Protocol.
//!
//! All methods live under the `safefix/` prefix except the apply trigger,
//! which rides on the standard `workspace/executeCommand` request.

use lsp_types::notification::Notification;
use lsp_types::request::Request;
use lsp_types::{ExecuteCommandParams, Range, WorkDoneProgressParams};
use serde::{Deserialize, Serialize};

use crate::types::{
	ApplyMode, CodeAssist, CodeAssistAction, ConfigurationFileChange, FunctionElement, Suggestion, SuggestionId,
};

/// Command name of the apply trigger sent through `workspace/executeCommand`.
pub const APPLY_CODE_ASSIST_COMMAND: &str = "safefix.applyCodeAssist";

/// `safefix/getSuggestions`: current suggestions for a document URI.
#[derive(Debug)]
pub enum GetSuggestions {}

impl Request for GetSuggestions {
	type Params = String;
	type Result = Option<Vec<Suggestion>>;
	const METHOD: &'static str = "safefix/getSuggestions";
}

/// Parameters of [`GetCodeAssistDiff`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeAssistDiffParams {
	/// Document URI.
	pub document_uri: String,
	/// Suggestion to preview.
	pub code_assist_id: SuggestionId,
	/// Number of unchanged context lines around each hunk.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub context_lines: Option<u32>,
}

/// `safefix/getCodeAssistDiff`: unified diff preview of one suggestion.
#[derive(Debug)]
pub enum GetCodeAssistDiff {}

impl Request for GetCodeAssistDiff {
	type Params = CodeAssistDiffParams;
	type Result = Option<String>;
	const METHOD: &'static str = "safefix/getCodeAssistDiff";
}

/// `safefix/getFunctionElements`: function boundaries of a document URI.
#[derive(Debug)]
pub enum GetFunctionElements {}

impl Request for GetFunctionElements {
	type Params = String;
	type Result = Option<Vec<FunctionElement>>;
	const METHOD: &'static str = "safefix/getFunctionElements";
}

/// Parameters of [`GetCodeAssists`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeAssistsParams {
	/// Document URI.
	pub document_uri: String,
	/// Selected range in the document.
	pub selection: Range,
}

/// `safefix/getCodeAssists`: every code assist available at a selection.
#[derive(Debug)]
pub enum GetCodeAssists {}

impl Request for GetCodeAssists {
	type Params = CodeAssistsParams;
	type Result = Option<Vec<CodeAssist>>;
	const METHOD: &'static str = "safefix/getCodeAssists";
}

/// Parameters of [`GetCodeAssistAction`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeAssistActionParams {
	/// Document URI.
	pub document_uri: String,
	/// Code assist whose edit is requested.
	pub code_assist_id: SuggestionId,
}

/// `safefix/getCodeAssistAction`: the edit one code assist would perform.
#[derive(Debug)]
pub enum GetCodeAssistAction {}

impl Request for GetCodeAssistAction {
	type Params = CodeAssistActionParams;
	type Result = Option<CodeAssistAction>;
	const METHOD: &'static str = "safefix/getCodeAssistAction";
}

/// `safefix/setConfigurationFileContent`: pushes a changed configuration file to the service.
#[derive(Debug)]
pub enum SetConfigurationFileContent {}

impl Request for SetConfigurationFileContent {
	type Params = ConfigurationFileChange;
	type Result = ();
	const METHOD: &'static str = "safefix/setConfigurationFileContent";
}

/// `safefix/documentUpdated`, sent by the server as a request.
///
/// The server fires this whenever an edit lands in a document, including
/// edits triggered by the client. It is the only confirmation that an apply
/// became visible.
#[derive(Debug)]
pub enum DocumentUpdated {}

impl Request for DocumentUpdated {
	type Params = String;
	type Result = ();
	const METHOD: &'static str = "safefix/documentUpdated";
}

/// Fire-and-forget form of [`DocumentUpdated`].
#[derive(Debug)]
pub enum DocumentUpdatedNotification {}

impl Notification for DocumentUpdatedNotification {
	type Params = String;
	const METHOD: &'static str = DocumentUpdated::METHOD;
}

/// Builds the `workspace/executeCommand` parameters that trigger one suggestion.
pub fn apply_code_assist_params(suggestion: &SuggestionId, mode: ApplyMode) -> serde_json::Result<ExecuteCommandParams> {
	Ok(ExecuteCommandParams {
		command: APPLY_CODE_ASSIST_COMMAND.into(),
		arguments: vec![serde_json::to_value(suggestion)?, serde_json::to_value(mode)?],
		work_done_progress_params: WorkDoneProgressParams::default(),
	})
}
