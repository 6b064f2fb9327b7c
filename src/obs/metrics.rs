// std
use std::sync::atomic::{AtomicU64, Ordering};
// self
use crate::obs::RequestOutcome;

/// Records a request transition via the global metrics recorder (when enabled).
pub fn record_request_outcome(outcome: RequestOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!("paced_client_requests_total", "outcome" => outcome.as_str())
			.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = outcome;
	}
}

/// Thread-safe counters describing scheduler activity.
#[derive(Debug, Default)]
pub struct SchedulerMetrics {
	enqueued: AtomicU64,
	admitted: AtomicU64,
	cancelled: AtomicU64,
	rejected: AtomicU64,
	forfeited: AtomicU64,
	listener_failures: AtomicU64,
}
impl SchedulerMetrics {
	/// Requests appended to the admission queue.
	pub fn enqueued(&self) -> u64 {
		self.enqueued.load(Ordering::Relaxed)
	}

	/// Requests admitted; always equal to the number of `RequestSent` events.
	pub fn admitted(&self) -> u64 {
		self.admitted.load(Ordering::Acquire)
	}

	/// Requests withdrawn before admission.
	pub fn cancelled(&self) -> u64 {
		self.cancelled.load(Ordering::Relaxed)
	}

	/// Requests refused or discarded because the client closed.
	pub fn rejected(&self) -> u64 {
		self.rejected.load(Ordering::Relaxed)
	}

	/// Whole budget units dropped because the queue was empty.
	pub fn forfeited(&self) -> u64 {
		self.forfeited.load(Ordering::Relaxed)
	}

	/// Listener invocations that panicked.
	pub fn listener_failures(&self) -> u64 {
		self.listener_failures.load(Ordering::Relaxed)
	}

	pub(crate) fn record_enqueued(&self) {
		self.enqueued.fetch_add(1, Ordering::Relaxed);
		record_request_outcome(RequestOutcome::Enqueued);
	}

	pub(crate) fn record_admitted(&self) {
		self.admitted.fetch_add(1, Ordering::Release);
		record_request_outcome(RequestOutcome::Admitted);
	}

	pub(crate) fn record_cancelled(&self) {
		self.cancelled.fetch_add(1, Ordering::Relaxed);
		record_request_outcome(RequestOutcome::Cancelled);
	}

	pub(crate) fn record_rejected(&self, count: u64) {
		self.rejected.fetch_add(count, Ordering::Relaxed);

		for _ in 0..count {
			record_request_outcome(RequestOutcome::Rejected);
		}
	}

	pub(crate) fn record_forfeited(&self, units: u64) {
		self.forfeited.fetch_add(units, Ordering::Relaxed);
	}

	pub(crate) fn record_listener_failure(&self) {
		self.listener_failures.fetch_add(1, Ordering::Relaxed);
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn record_request_outcome_noop_without_metrics() {
		record_request_outcome(RequestOutcome::Failed);
	}

	#[test]
	fn counters_accumulate() {
		let metrics = SchedulerMetrics::default();

		metrics.record_enqueued();
		metrics.record_enqueued();
		metrics.record_admitted();
		metrics.record_cancelled();
		metrics.record_rejected(2);
		metrics.record_forfeited(5);
		metrics.record_listener_failure();

		assert_eq!(metrics.enqueued(), 2);
		assert_eq!(metrics.admitted(), 1);
		assert_eq!(metrics.cancelled(), 1);
		assert_eq!(metrics.rejected(), 2);
		assert_eq!(metrics.forfeited(), 5);
		assert_eq!(metrics.listener_failures(), 1);
	}
}
