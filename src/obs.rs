//! Optional observability helpers for the scheduler and response handles.
//!
//! # Feature Flags
//!
//! - Enable `tracing` (on by default) to wrap scheduler wakes in spans named
//!   `paced_client.scheduler` with a `stage` field and to log admissions, cancellations, closes,
//!   and listener failures.
//! - Enable `metrics` to increment the `paced_client_requests_total` counter for every request
//!   transition, labeled by `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Request transitions recorded by the client.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RequestOutcome {
	/// Appended to the admission queue.
	Enqueued,
	/// Released by the scheduler and handed to the transport.
	Admitted,
	/// Withdrawn while still queued.
	Cancelled,
	/// Refused because the client was closed.
	Rejected,
	/// Transport returned a response.
	Completed,
	/// Transport failed.
	Failed,
}
impl RequestOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			RequestOutcome::Enqueued => "enqueued",
			RequestOutcome::Admitted => "admitted",
			RequestOutcome::Cancelled => "cancelled",
			RequestOutcome::Rejected => "rejected",
			RequestOutcome::Completed => "completed",
			RequestOutcome::Failed => "failed",
		}
	}
}
impl Display for RequestOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
