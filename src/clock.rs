//! Elapsed-time sources that drive admission budgets.
//!
//! All scheduling math reads time exclusively through [`Clock::elapsed`], so swapping the
//! [`SystemClock`] for a [`ManualClock`] makes a whole client deterministic.

// std
use std::time::Instant;
// self
use crate::_prelude::*;

/// Callback registered through [`Clock::on_advance`].
///
/// The hook returns `false` once its owner is gone so the clock can drop it.
pub type AdvanceHook = Arc<dyn Fn() -> bool + Send + Sync>;

/// Monotonic source of elapsed time.
pub trait Clock
where
	Self: Send + Sync,
{
	/// Time elapsed since the clock's origin; never decreases.
	fn elapsed(&self) -> Duration;

	/// Registers a hook invoked synchronously after every manual advance.
	///
	/// Real clocks never advance manually, so the default implementation discards the hook and
	/// callers fall back to a periodic ticker.
	fn on_advance(&self, hook: AdvanceHook) {
		let _ = hook;
	}
}

/// Wall-clock implementation backed by [`Instant`].
#[derive(Clone, Copy, Debug)]
pub struct SystemClock {
	origin: Instant,
}
impl SystemClock {
	/// Starts a clock whose origin is the current instant.
	pub fn new() -> Self {
		Self { origin: Instant::now() }
	}
}
impl Default for SystemClock {
	fn default() -> Self {
		Self::new()
	}
}
impl Clock for SystemClock {
	fn elapsed(&self) -> Duration {
		Duration::try_from(self.origin.elapsed()).unwrap_or(Duration::MAX)
	}
}

/// Virtual clock advanced explicitly by tests or simulations.
///
/// Clones share the same timeline, so a test keeps one handle while the client owns another.
/// Every [`advance`](ManualClock::advance) runs the registered hooks before returning, which lets
/// a test observe the resulting admissions synchronously.
#[derive(Clone, Default)]
pub struct ManualClock(Arc<ManualClockInner>);
impl ManualClock {
	/// Creates a clock positioned at zero elapsed time.
	pub fn new() -> Self {
		Self::default()
	}

	/// Moves time forward by `by` and notifies every hook. Negative durations are ignored.
	pub fn advance(&self, by: Duration) {
		if by.is_negative() {
			return;
		}

		*self.0.elapsed.lock() += by;

		self.notify();
	}

	/// Moves time forward to `to`; earlier targets leave the clock untouched.
	pub fn advance_to(&self, to: Duration) {
		{
			let mut elapsed = self.0.elapsed.lock();

			if to <= *elapsed {
				return;
			}

			*elapsed = to;
		}

		self.notify();
	}

	/// Number of live hooks currently registered.
	pub fn hook_count(&self) -> usize {
		self.0.hooks.lock().len()
	}

	fn notify(&self) {
		// Hooks run without the lock held so they may read the clock or register new hooks.
		let hooks = self.0.hooks.lock().clone();
		let dead = hooks.into_iter().filter(|hook| !hook()).collect::<Vec<_>>();

		if !dead.is_empty() {
			self.0.hooks.lock().retain(|hook| !dead.iter().any(|d| Arc::ptr_eq(hook, d)));
		}
	}
}
impl Clock for ManualClock {
	fn elapsed(&self) -> Duration {
		*self.0.elapsed.lock()
	}

	fn on_advance(&self, hook: AdvanceHook) {
		self.0.hooks.lock().push(hook);
	}
}
impl Debug for ManualClock {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ManualClock")
			.field("elapsed", &self.elapsed())
			.field("hooks", &self.hook_count())
			.finish()
	}
}

struct ManualClockInner {
	elapsed: Mutex<Duration>,
	hooks: Mutex<Vec<AdvanceHook>>,
}
impl Default for ManualClockInner {
	fn default() -> Self {
		Self { elapsed: Mutex::new(Duration::ZERO), hooks: Mutex::new(Vec::new()) }
	}
}
