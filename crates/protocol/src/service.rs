//! Request/response access to the suggestion service.

use std::sync::Arc;
use std::sync::atomic::{AtomicI32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use lsp_types::Range;
use lsp_types::request::{ExecuteCommand, Request};
use url::Url;

use crate::ext::{
	self, CodeAssistActionParams, CodeAssistDiffParams, CodeAssistsParams, GetCodeAssistAction, GetCodeAssistDiff,
	GetCodeAssists, GetFunctionElements, GetSuggestions, SetConfigurationFileContent,
};
use crate::types::{
	AnyRequest, AnyResponse, ApplyMode, CodeAssist, CodeAssistAction, ConfigurationFileChange, FunctionElement, RequestId,
	Suggestion, SuggestionId,
};
use crate::{Error, Result};

/// Operations the orchestration layer needs from the suggestion service.
///
/// Every call may fail on transport or service errors. Completion of
/// [`trigger_apply`](Self::trigger_apply) does not mean the edit is visible
/// yet; that is signalled later by a `documentUpdated` message.
#[async_trait]
pub trait SuggestionService: Send + Sync {
	/// Fetches the current suggestions for a document.
	async fn suggestions(&self, document: &Url) -> Result<Option<Vec<Suggestion>>>;

	/// Asks the service to apply one suggestion.
	async fn trigger_apply(&self, suggestion: &SuggestionId, mode: ApplyMode) -> Result<()>;

	/// Fetches a diff preview of one suggestion.
	async fn code_assist_diff(&self, _document: &Url, _suggestion: &SuggestionId, _context_lines: Option<u32>) -> Result<Option<String>> {
		Ok(None)
	}

	/// Fetches the function boundaries of a document.
	async fn function_elements(&self, _document: &Url) -> Result<Option<Vec<FunctionElement>>> {
		Ok(None)
	}

	/// Fetches every code assist available at `selection`, safe or not.
	async fn code_assists(&self, _document: &Url, _selection: Range) -> Result<Option<Vec<CodeAssist>>> {
		Ok(None)
	}

	/// Fetches the edit one code assist would perform.
	async fn code_assist_action(&self, _document: &Url, _code_assist: &SuggestionId) -> Result<Option<CodeAssistAction>> {
		Ok(None)
	}

	/// Pushes a changed configuration file to the service.
	async fn set_configuration_file_content(&self, _change: ConfigurationFileChange) -> Result<()> {
		Ok(())
	}
}

/// Client-to-server request channel of an established connection.
///
/// Implementations own framing and response correlation. A `timeout` of
/// `None` waits indefinitely.
#[async_trait]
pub trait ServiceTransport: Send + Sync {
	/// Sends a request and waits for its response.
	async fn request(&self, req: AnyRequest, timeout: Option<Duration>) -> Result<AnyResponse>;
}

/// [`SuggestionService`] speaking the LSP extension methods in [`ext`].
pub struct LspSuggestionService {
	transport: Arc<dyn ServiceTransport>,
	/// Per-request timeout, `Duration::ZERO` disables it.
	timeout: Duration,
	next_id: AtomicI32,
}

impl std::fmt::Debug for LspSuggestionService {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("LspSuggestionService")
			.field("timeout", &self.timeout)
			.field("next_id", &self.next_id)
			.finish_non_exhaustive()
	}
}

impl LspSuggestionService {
	/// Creates a service over `transport`.
	pub fn new(transport: Arc<dyn ServiceTransport>, timeout: Duration) -> Self {
		Self {
			transport,
			timeout,
			next_id: AtomicI32::new(0),
		}
	}

	/// Sends a typed request.
	pub async fn request<R: Request>(&self, params: R::Params) -> Result<R::Result> {
		let req = AnyRequest {
			id: RequestId::Number(self.next_id.fetch_add(1, Ordering::Relaxed)),
			method: R::METHOD.into(),
			params: serde_json::to_value(params)?,
		};
		let timeout = (self.timeout != Duration::ZERO).then_some(self.timeout);
		let resp = self.transport.request(req, timeout).await.inspect_err(|err| {
			tracing::debug!(method = R::METHOD, error = %err, "service.request.failed");
		})?;
		match resp.error {
			None => Ok(serde_json::from_value(resp.result.unwrap_or_default())?),
			Some(err) => Err(Error::Response(err)),
		}
	}
}

#[async_trait]
impl SuggestionService for LspSuggestionService {
	async fn suggestions(&self, document: &Url) -> Result<Option<Vec<Suggestion>>> {
		self.request::<GetSuggestions>(document.to_string()).await
	}

	async fn trigger_apply(&self, suggestion: &SuggestionId, mode: ApplyMode) -> Result<()> {
		let params = ext::apply_code_assist_params(suggestion, mode)?;
		self.request::<ExecuteCommand>(params).await?;
		Ok(())
	}

	async fn code_assist_diff(&self, document: &Url, suggestion: &SuggestionId, context_lines: Option<u32>) -> Result<Option<String>> {
		self.request::<GetCodeAssistDiff>(CodeAssistDiffParams {
			document_uri: document.to_string(),
			code_assist_id: suggestion.clone(),
			context_lines,
		})
		.await
	}

	async fn function_elements(&self, document: &Url) -> Result<Option<Vec<FunctionElement>>> {
		self.request::<GetFunctionElements>(document.to_string()).await
	}

	async fn code_assists(&self, document: &Url, selection: Range) -> Result<Option<Vec<CodeAssist>>> {
		self.request::<GetCodeAssists>(CodeAssistsParams {
			document_uri: document.to_string(),
			selection,
		})
		.await
	}

	async fn code_assist_action(&self, document: &Url, code_assist: &SuggestionId) -> Result<Option<CodeAssistAction>> {
		self.request::<GetCodeAssistAction>(CodeAssistActionParams {
			document_uri: document.to_string(),
			code_assist_id: code_assist.clone(),
		})
		.await
	}

	async fn set_configuration_file_content(&self, change: ConfigurationFileChange) -> Result<()> {
		self.request::<SetConfigurationFileContent>(change).await
	}
}
