//! Routing of server-initiated messages.
//!
//! The suggestion service announces landed edits with `safefix/documentUpdated`,
//! either as a request (the client acknowledges with `null`) or as a plain
//! notification. Both forms are published into the connection's
//! [`NotificationBus`].

use safefix_protocol::ext::DocumentUpdated;
use safefix_protocol::lsp_types::request::Request;
use safefix_protocol::{AnyNotification, AnyRequest, AnyResponse, JsonValue, ResponseError};
use url::Url;

use crate::bus::NotificationBus;

/// Dispatches server-to-client messages of one connection.
#[derive(Debug, Clone)]
pub struct ServerMessageRouter {
	bus: NotificationBus,
}

impl ServerMessageRouter {
	/// Creates a router publishing into `bus`.
	pub fn new(bus: NotificationBus) -> Self {
		Self { bus }
	}

	/// The bus updates are published into.
	pub fn bus(&self) -> &NotificationBus {
		&self.bus
	}

	/// Answers a server request. Replies once every listener has seen the event.
	pub async fn handle_request(&self, req: AnyRequest) -> AnyResponse {
		let result = if req.method == DocumentUpdated::METHOD {
			self.document_updated(req.params).await
		} else {
			tracing::debug!(method = req.method.as_str(), "connection.request.unhandled");
			Err(ResponseError::new(
				ResponseError::METHOD_NOT_FOUND,
				format_args!("unhandled method {}", req.method),
			))
		};

		match result {
			Ok(()) => AnyResponse {
				id: req.id,
				result: Some(JsonValue::Null),
				error: None,
			},
			Err(error) => AnyResponse {
				id: req.id,
				result: None,
				error: Some(error),
			},
		}
	}

	/// Handles a server notification. Returns false for unknown methods.
	pub async fn handle_notification(&self, notif: AnyNotification) -> bool {
		if notif.method != DocumentUpdated::METHOD {
			tracing::debug!(method = notif.method.as_str(), "connection.notification.unhandled");
			return false;
		}
		if let Err(error) = self.document_updated(notif.params).await {
			tracing::warn!(%error, "connection.notification.invalid");
		}
		true
	}

	async fn document_updated(&self, params: JsonValue) -> Result<(), ResponseError> {
		let uri: String =
			serde_json::from_value(params).map_err(|err| ResponseError::new(ResponseError::INVALID_PARAMS, err))?;
		let document = Url::parse(&uri).map_err(|err| ResponseError::new(ResponseError::INVALID_PARAMS, err))?;
		tracing::trace!(uri = document.as_str(), "connection.document_updated");
		self.bus.publish(&document).await;
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use std::sync::Arc;
	use std::sync::atomic::{AtomicUsize, Ordering};

	use pretty_assertions::assert_eq;
	use safefix_protocol::RequestId;
	use serde_json::json;

	use super::*;

	fn counting_router() -> (ServerMessageRouter, Arc<AtomicUsize>, crate::bus::Subscription) {
		let bus = NotificationBus::new();
		let hits = Arc::new(AtomicUsize::new(0));
		let seen = hits.clone();
		let sub = bus.subscribe_fn(move |document| {
			assert_eq!(document.as_str(), "file:///ws/a.ts");
			seen.fetch_add(1, Ordering::SeqCst);
		});
		(ServerMessageRouter::new(bus), hits, sub)
	}

	#[tokio::test]
	async fn document_updated_request_publishes_and_acks() {
		let (router, hits, _sub) = counting_router();

		let resp = router
			.handle_request(AnyRequest {
				id: RequestId::Number(7),
				method: "safefix/documentUpdated".into(),
				params: json!("file:///ws/a.ts"),
			})
			.await;

		assert_eq!(resp.id, RequestId::Number(7));
		assert_eq!(resp.result, Some(JsonValue::Null));
		assert!(resp.error.is_none());
		assert_eq!(hits.load(Ordering::SeqCst), 1);
	}

	#[tokio::test]
	async fn document_updated_notification_publishes() {
		let (router, hits, _sub) = counting_router();

		let handled = router
			.handle_notification(AnyNotification {
				method: "safefix/documentUpdated".into(),
				params: json!("file:///ws/a.ts"),
			})
			.await;

		assert!(handled);
		assert_eq!(hits.load(Ordering::SeqCst), 1);
	}

	#[tokio::test]
	async fn invalid_params_are_rejected() {
		let (router, hits, _sub) = counting_router();

		let resp = router
			.handle_request(AnyRequest {
				id: RequestId::Number(1),
				method: "safefix/documentUpdated".into(),
				params: json!({ "uri": 3 }),
			})
			.await;

		assert_eq!(resp.error.map(|e| e.code), Some(ResponseError::INVALID_PARAMS));
		assert_eq!(hits.load(Ordering::SeqCst), 0);
	}

	#[tokio::test]
	async fn unknown_methods() {
		let (router, _hits, _sub) = counting_router();

		let resp = router
			.handle_request(AnyRequest {
				id: RequestId::String("x".into()),
				method: "safefix/selectOption".into(),
				params: JsonValue::Null,
			})
			.await;
		assert_eq!(resp.error.map(|e| e.code), Some(ResponseError::METHOD_NOT_FOUND));

		let handled = router
			.handle_notification(AnyNotification {
				method: "$/progress".into(),
				params: JsonValue::Null,
			})
			.await;
		assert!(!handled);
	}
}
