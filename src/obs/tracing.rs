// self
use crate::{_prelude::*, error::ListenerError, request::Request, request::RequestId};

/// A span wrapping one scheduler wake.
#[derive(Clone, Debug)]
pub struct SchedulerSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl SchedulerSpan {
	/// Creates a new span tagged with the provided stage.
	pub fn new(stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::debug_span!("paced_client.scheduler", stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = stage;

			Self {}
		}
	}

	/// Enters the span for the synchronous drain pass.
	pub fn entered(self) -> SchedulerSpanGuard {
		#[cfg(feature = "tracing")]
		{
			SchedulerSpanGuard { guard: self.span.entered() }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = self;

			SchedulerSpanGuard {}
		}
	}
}

/// RAII guard returned by [`SchedulerSpan::entered`].
pub struct SchedulerSpanGuard {
	#[cfg(feature = "tracing")]
	#[allow(dead_code)]
	guard: tracing::span::EnteredSpan,
}
impl Debug for SchedulerSpanGuard {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("SchedulerSpanGuard(..)")
	}
}

pub(crate) fn log_admitted(request: &Request, elapsed: Duration, dispatched: u64) {
	#[cfg(feature = "tracing")]
	tracing::debug!(
		request = %request.id(),
		method = request.method().as_str(),
		url = %request.url(),
		elapsed_secs = elapsed.as_seconds_f64(),
		dispatched,
		"request admitted"
	);
	#[cfg(not(feature = "tracing"))]
	let _ = (request, elapsed, dispatched);
}

pub(crate) fn log_cancelled(id: RequestId) {
	#[cfg(feature = "tracing")]
	tracing::debug!(request = %id, "queued request cancelled");
	#[cfg(not(feature = "tracing"))]
	let _ = id;
}

pub(crate) fn log_forfeited(units: u64, elapsed: Duration) {
	#[cfg(feature = "tracing")]
	tracing::trace!(units, elapsed_secs = elapsed.as_seconds_f64(), "idle budget forfeited");
	#[cfg(not(feature = "tracing"))]
	let _ = (units, elapsed);
}

pub(crate) fn log_closed(rejected: usize) {
	#[cfg(feature = "tracing")]
	tracing::info!(rejected, "client closed");
	#[cfg(not(feature = "tracing"))]
	let _ = rejected;
}

pub(crate) fn log_listener_failure(error: &ListenerError) {
	#[cfg(feature = "tracing")]
	tracing::warn!(
		listener = error.listener,
		event = error.event,
		message = %error.message,
		"event listener failed"
	);
	#[cfg(not(feature = "tracing"))]
	let _ = error;
}
