//! Instantaneous allowed rate as a pure function of elapsed time.

// self
use crate::{_prelude::*, config::RateLimitConfig};

/// Linear ramp from a start rate to a target rate, held constant after the ramp.
///
/// `rate(t) = start + (target - start) * clamp(t / ramp, 0, 1)`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RateFunction {
	start_rate: f64,
	target_rate: f64,
	ramp_duration: Duration,
}
impl RateFunction {
	/// Builds the function described by an already validated configuration.
	pub fn new(config: &RateLimitConfig) -> Self {
		Self {
			start_rate: config.start_rate(),
			target_rate: config.target_rate(),
			ramp_duration: config.ramp_duration(),
		}
	}

	/// Requests per second allowed at `elapsed`.
	pub fn rate_at(&self, elapsed: Duration) -> f64 {
		if self.start_rate == self.target_rate || elapsed >= self.ramp_duration {
			return self.target_rate;
		}
		if !elapsed.is_positive() {
			return self.start_rate;
		}

		// Multiply before dividing so whole-second points on an integral ramp stay exact.
		let span = self.target_rate - self.start_rate;

		self.start_rate + span * elapsed.as_seconds_f64() / self.ramp_duration.as_seconds_f64()
	}

	/// Returns `true` once `elapsed` reaches the end of the ramp.
	pub fn ramp_complete(&self, elapsed: Duration) -> bool {
		elapsed >= self.ramp_duration
	}
}
