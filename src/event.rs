//! Lifecycle events and the fan-out bus that delivers them to listeners.

// std
use std::panic::{self, AssertUnwindSafe};
// self
use crate::{
	_prelude::*,
	error::ListenerError,
	request::{Request, RequestId},
};

/// Callback registered on an [`EventBus`].
pub type Listener = Arc<dyn Fn(&Event) + Send + Sync>;

/// Lifecycle notifications published by the client.
///
/// `RequestSent` fires exactly once per admitted request, in admission order. The completion
/// variants fire from the producer's task once the transport finishes and are therefore ordered
/// only per request.
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum Event {
	/// The scheduler admitted the request and handed it to the transport.
	RequestSent {
		/// Admitted request.
		request: Request,
	},
	/// The transport produced a response.
	ResponseReceived {
		/// Request that was answered.
		request: Request,
		/// Response status code.
		status: u16,
		/// Clock time between admission and completion.
		latency: Duration,
	},
	/// The transport failed.
	RequestFailed {
		/// Request that failed.
		request: Request,
		/// Rendered transport error.
		reason: String,
	},
}
impl Event {
	/// Returns a stable label suitable for logs.
	pub const fn kind(&self) -> &'static str {
		match self {
			Event::RequestSent { .. } => "request_sent",
			Event::ResponseReceived { .. } => "response_received",
			Event::RequestFailed { .. } => "request_failed",
		}
	}

	/// Request the event refers to.
	pub fn request(&self) -> &Request {
		match self {
			Event::RequestSent { request }
			| Event::ResponseReceived { request, .. }
			| Event::RequestFailed { request, .. } => request,
		}
	}
}

/// Ordered fan-out of [`Event`]s to every registered listener.
///
/// Listeners run synchronously on the publishing thread. A panicking listener is caught and
/// reported as a [`ListenerError`]; delivery continues with the next listener.
#[derive(Default)]
pub struct EventBus {
	listeners: RwLock<Vec<Listener>>,
}
impl EventBus {
	/// Registers a listener that receives every subsequent event.
	pub fn add_listener<F>(&self, listener: F)
	where
		F: 'static + Fn(&Event) + Send + Sync,
	{
		self.listeners.write().push(Arc::new(listener));
	}

	/// Number of registered listeners.
	pub fn len(&self) -> usize {
		self.listeners.read().len()
	}

	/// Returns `true` when no listener is registered.
	pub fn is_empty(&self) -> bool {
		self.listeners.read().is_empty()
	}

	/// Delivers `event` to each listener in registration order, returning the isolated failures.
	pub fn publish(&self, event: &Event) -> Vec<ListenerError> {
		// Snapshot so listeners may register further listeners without deadlocking.
		let listeners = self.listeners.read().clone();

		listeners
			.iter()
			.enumerate()
			.filter_map(|(idx, listener)| {
				panic::catch_unwind(AssertUnwindSafe(|| listener(event))).err().map(|payload| {
					ListenerError {
						listener: idx,
						event: event.kind(),
						message: panic_message(payload.as_ref()),
					}
				})
			})
			.collect()
	}
}
impl Debug for EventBus {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("EventBus").field("listeners", &self.len()).finish()
	}
}

/// Listener that keeps every event it sees, for assertions and post-run reports.
#[derive(Clone, Debug, Default)]
pub struct EventRecorder(Arc<Mutex<Vec<Event>>>);
impl EventRecorder {
	/// Returns a listener closure appending into this recorder.
	pub fn listener(&self) -> impl 'static + Fn(&Event) + Send + Sync {
		let events = Arc::clone(&self.0);

		move |event| events.lock().push(event.clone())
	}

	/// All recorded events in delivery order.
	pub fn events(&self) -> Vec<Event> {
		self.0.lock().clone()
	}

	/// Requests observed through [`Event::RequestSent`], in admission order.
	pub fn sent(&self) -> Vec<Request> {
		self.0
			.lock()
			.iter()
			.filter_map(|event| match event {
				Event::RequestSent { request } => Some(request.clone()),
				_ => None,
			})
			.collect()
	}

	/// Identifiers of admitted requests, in admission order.
	pub fn sent_ids(&self) -> Vec<RequestId> {
		self.sent().iter().map(Request::id).collect()
	}

	/// Number of admitted requests observed so far.
	pub fn sent_count(&self) -> usize {
		self.0.lock().iter().filter(|event| matches!(event, Event::RequestSent { .. })).count()
	}

	/// Drops every recorded event.
	pub fn clear(&self) {
		self.0.lock().clear();
	}
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
	if let Some(message) = payload.downcast_ref::<&str>() {
		return (*message).to_owned();
	}
	if let Some(message) = payload.downcast_ref::<String>() {
		return message.clone();
	}

	String::from("listener panicked with a non-string payload")
}
