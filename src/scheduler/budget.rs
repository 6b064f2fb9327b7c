//! Discrete admission budget derived from a continuous [`RateFunction`].

// self
use crate::{_prelude::*, rate::RateFunction};

/// Slack added before flooring so that carries accumulated in binary floating point (ten times
/// `0.1`, for example) still release the whole unit they add up to.
const CARRY_EPSILON: f64 = 1e-9;

/// Integrates a [`RateFunction`] into a monotonically non-decreasing count of allowed requests.
///
/// Each [`advance`](BudgetAccumulator::advance) to elapsed time `t` adds
/// `rate(t) * (t - last_tick) + carry`; the whole part joins `allowed_total` and the fraction
/// carries into the next advance so non-integer rates are honored on average.
#[derive(Clone, Debug)]
pub struct BudgetAccumulator {
	rate: RateFunction,
	allowed_total: u64,
	carry: f64,
	last_tick: Duration,
}
impl BudgetAccumulator {
	/// Creates an accumulator positioned at zero elapsed time.
	pub fn new(rate: RateFunction) -> Self {
		Self::starting_at(rate, Duration::ZERO)
	}

	/// Creates an accumulator whose first interval starts at `origin`.
	pub fn starting_at(rate: RateFunction, origin: Duration) -> Self {
		Self { rate, allowed_total: 0, carry: 0., last_tick: origin }
	}

	/// Advances to `now`, returning the number of newly allowed requests.
	///
	/// Times at or before the previous tick allow nothing and leave the state untouched.
	pub fn advance(&mut self, now: Duration) -> u64 {
		if now <= self.last_tick {
			return 0;
		}

		let step = (now - self.last_tick).as_seconds_f64();
		let delta = self.rate.rate_at(now) * step + self.carry;
		let whole = (delta + CARRY_EPSILON).floor();

		self.carry = (delta - whole).max(0.);
		self.last_tick = now;

		// Float-to-int casts saturate, so absurd rates clamp instead of wrapping.
		let newly = whole as u64;

		self.allowed_total = self.allowed_total.saturating_add(newly);

		newly
	}

	/// Total requests allowed since construction.
	pub fn allowed_total(&self) -> u64 {
		self.allowed_total
	}

	/// Fractional budget carried into the next advance, in `[0, 1)`.
	pub fn carry(&self) -> f64 {
		self.carry
	}

	/// Elapsed time of the most recent advance.
	pub fn last_tick(&self) -> Duration {
		self.last_tick
	}

	/// Rate function being integrated.
	pub fn rate(&self) -> &RateFunction {
		&self.rate
	}
}
