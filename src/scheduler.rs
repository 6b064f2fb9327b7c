//! Single-writer scheduler that turns the rate budget into ordered admissions.
//!
//! Producers only touch the [`AdmissionQueue`]; every piece of rate state lives in a
//! [`SchedulerCore`] guarded by a mutex that is only ever acquired with `try_lock`. A wake that
//! finds the core busy raises a pending flag instead of waiting, and the thread currently
//! draining re-checks that flag before it lets go. Exactly one drain pass runs at a time, no wake
//! is lost, and listeners or transports may enqueue re-entrantly without deadlocking.

pub mod budget;
pub mod queue;

pub use budget::*;
pub use queue::*;

// std
use std::sync::{
	Weak,
	atomic::{AtomicBool, AtomicU8, Ordering},
};
// crates.io
use tokio::{runtime::Handle, sync::oneshot, task::JoinHandle};
// self
use crate::{
	_prelude::*,
	clock::Clock,
	config::RateLimitConfig,
	error::TransportError,
	event::{Event, EventBus},
	obs::{self, RequestOutcome, SchedulerMetrics, SchedulerSpan},
	rate::RateFunction,
	request::{Request, RequestId, Response},
	transport::Transport,
};

/// Task driving one admitted request's transport call to completion.
pub type ResponseTask = JoinHandle<Result<Response, TransportError>>;

/// Observable scheduler lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SchedulerState {
	/// No drain pass is running.
	Idle,
	/// Releasing queued requests up to the current budget.
	Draining,
	/// Terminal: nothing drains and new requests are rejected.
	Closed,
}
impl SchedulerState {
	const fn from_u8(raw: u8) -> Self {
		match raw {
			0 => SchedulerState::Idle,
			1 => SchedulerState::Draining,
			_ => SchedulerState::Closed,
		}
	}

	const fn as_u8(self) -> u8 {
		match self {
			SchedulerState::Idle => 0,
			SchedulerState::Draining => 1,
			SchedulerState::Closed => 2,
		}
	}
}

/// Hand-off delivered to the producer once its request is admitted.
pub struct Admission {
	/// The admitted request.
	pub request: Request,
	/// Transport call spawned at admission; it runs whether or not anyone awaits it.
	pub response: ResponseTask,
	/// Clock time of admission.
	pub admitted_at: Duration,
}
impl Debug for Admission {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Admission")
			.field("request", &self.request)
			.field("admitted_at", &self.admitted_at)
			.finish()
	}
}

/// Queued request paired with the channel its producer waits on.
#[derive(Debug)]
pub struct Pending {
	request: Request,
	admit: oneshot::Sender<Admission>,
}
impl Pending {
	/// Pairs a request with its admission channel.
	pub fn new(request: Request, admit: oneshot::Sender<Admission>) -> Self {
		Self { request, admit }
	}

	/// Returns `true` when the waiting producer has gone away.
	fn is_abandoned(&self) -> bool {
		self.admit.is_closed()
	}
}

/// Rate state owned exclusively by the draining thread.
#[derive(Clone, Debug)]
pub struct SchedulerCore {
	budget: BudgetAccumulator,
	available: u64,
	dispatched: u64,
	forfeited: u64,
}
impl SchedulerCore {
	/// Creates the state for a validated configuration, starting at `origin`.
	pub fn new(config: &RateLimitConfig, origin: Duration) -> Self {
		Self {
			budget: BudgetAccumulator::starting_at(RateFunction::new(config), origin),
			available: 0,
			dispatched: 0,
			forfeited: 0,
		}
	}

	/// Budget allowed but neither dispatched nor forfeited yet.
	pub fn available(&self) -> u64 {
		self.available
	}

	fn accrue(&mut self, now: Duration) {
		let newly = self.budget.advance(now);

		self.available = self.available.saturating_add(newly);
	}

	fn forfeit(&mut self) -> u64 {
		let unused = self.available;

		self.forfeited = self.forfeited.saturating_add(unused);
		self.available = 0;

		unused
	}

	/// Requests admitted so far.
	pub fn dispatched(&self) -> u64 {
		self.dispatched
	}

	/// Budget units dropped while the queue was empty.
	pub fn forfeited(&self) -> u64 {
		self.forfeited
	}

	/// Underlying accumulator.
	pub fn budget(&self) -> &BudgetAccumulator {
		&self.budget
	}
}

/// Admission scheduler shared by a client and its response handles.
///
/// Every admitted request's transport call is spawned onto the scheduler's runtime right away, so
/// requests leave at the scheduled rate no matter when (or whether) producers poll their handles.
pub struct Scheduler {
	this: Weak<Scheduler>,
	runtime: Handle,
	clock: Arc<dyn Clock>,
	transport: Arc<dyn Transport>,
	bus: EventBus,
	queue: AdmissionQueue<Pending>,
	core: Mutex<SchedulerCore>,
	wake_pending: AtomicBool,
	state: AtomicU8,
	metrics: SchedulerMetrics,
}
impl Scheduler {
	/// Creates a scheduler whose budget starts accruing at the clock's current time.
	///
	/// Transport calls of admitted requests are spawned on `runtime`.
	pub fn new(
		config: &RateLimitConfig,
		clock: Arc<dyn Clock>,
		transport: Arc<dyn Transport>,
		bus: EventBus,
		runtime: Handle,
	) -> Arc<Self> {
		let core = SchedulerCore::new(config, clock.elapsed());

		Arc::new_cyclic(|this| Self {
			this: this.clone(),
			runtime,
			clock,
			transport,
			bus,
			queue: AdmissionQueue::new(),
			core: Mutex::new(core),
			wake_pending: AtomicBool::new(false),
			state: AtomicU8::new(SchedulerState::Idle.as_u8()),
			metrics: SchedulerMetrics::default(),
		})
	}

	/// Appends a request and wakes the scheduler.
	pub fn enqueue(&self, pending: Pending) -> Result<()> {
		let id = pending.request.id();

		if self.queue.enqueue(id, pending).is_err() {
			self.metrics.record_rejected(1);

			return Err(Error::Closed);
		}

		self.metrics.record_enqueued();
		self.wake();

		Ok(())
	}

	/// Withdraws a still-queued request without consuming budget or publishing events.
	pub fn cancel(&self, id: RequestId) -> bool {
		match self.queue.cancel(id) {
			Some(_) => {
				self.metrics.record_cancelled();
				obs::log_cancelled(id);

				true
			},
			None => false,
		}
	}

	/// Runs drain passes until no wake is pending, returning the number of admissions.
	///
	/// Returns immediately (after flagging the wake) when another thread is already draining.
	pub fn wake(&self) -> u64 {
		let mut admitted = 0;

		loop {
			self.wake_pending.store(true, Ordering::SeqCst);

			let Some(mut core) = self.core.try_lock() else {
				return admitted;
			};

			while self.wake_pending.swap(false, Ordering::SeqCst) {
				admitted += self.drain(&mut core);
			}

			drop(core);

			// A wake raised between the final swap and the unlock must not be lost.
			if !self.wake_pending.load(Ordering::SeqCst) {
				return admitted;
			}
		}
	}

	/// Transitions to [`SchedulerState::Closed`], rejecting everything still queued.
	///
	/// Returns the number of queued requests that were discarded.
	pub fn close(&self) -> usize {
		let previous = self.state.swap(SchedulerState::Closed.as_u8(), Ordering::AcqRel);

		if SchedulerState::from_u8(previous) == SchedulerState::Closed {
			return 0;
		}

		// Dropping the senders resolves every waiting producer with `Error::Closed`.
		let rejected = self.queue.close().len();

		self.metrics.record_rejected(rejected as u64);
		obs::log_closed(rejected);

		rejected
	}

	/// Publishes a lifecycle event outside the admission path.
	pub fn notify(&self, event: &Event) {
		for failure in self.bus.publish(event) {
			self.metrics.record_listener_failure();
			obs::log_listener_failure(&failure);
		}
	}

	/// Registers an event listener.
	pub fn add_listener<F>(&self, listener: F)
	where
		F: 'static + Fn(&Event) + Send + Sync,
	{
		self.bus.add_listener(listener);
	}

	/// Current lifecycle state.
	pub fn state(&self) -> SchedulerState {
		SchedulerState::from_u8(self.state.load(Ordering::Acquire))
	}

	/// Returns `true` once closed.
	pub fn is_closed(&self) -> bool {
		self.state() == SchedulerState::Closed
	}

	/// Requests admitted so far.
	pub fn dispatched(&self) -> u64 {
		self.metrics.admitted()
	}

	/// Requests still waiting for budget.
	pub fn queued(&self) -> usize {
		self.queue.len()
	}

	/// Elapsed time reported by the scheduler's clock.
	pub fn elapsed(&self) -> Duration {
		self.clock.elapsed()
	}

	/// Activity counters.
	pub fn metrics(&self) -> &SchedulerMetrics {
		&self.metrics
	}

	/// Copy of the rate state, or `None` while a drain pass holds it.
	pub fn snapshot(&self) -> Option<SchedulerCore> {
		self.core.try_lock().map(|core| core.clone())
	}

	fn drain(&self, core: &mut SchedulerCore) -> u64 {
		if self.is_closed() {
			return 0;
		}

		let _span = SchedulerSpan::new("drain").entered();
		let now = self.clock.elapsed();

		core.accrue(now);

		if core.available == 0 {
			return 0;
		}

		self.transition(SchedulerState::Idle, SchedulerState::Draining);

		let mut admitted = 0;
		let mut rejected = 0;

		while core.available > 0 && !self.is_closed() {
			let batch =
				self.queue.dequeue_up_to(usize::try_from(core.available).unwrap_or(usize::MAX));

			if batch.is_empty() {
				break;
			}

			for pending in batch {
				// A listener may close the scheduler halfway through a batch.
				if self.is_closed() {
					rejected += 1;

					continue;
				}
				if pending.is_abandoned() {
					self.metrics.record_cancelled();
					obs::log_cancelled(pending.request.id());

					continue;
				}

				core.available -= 1;
				core.dispatched += 1;
				admitted += 1;

				self.dispatch(pending, now, core.dispatched);
			}
		}

		if rejected > 0 {
			self.metrics.record_rejected(rejected);
		}

		// Unused whole units do not bank across idle periods.
		if !self.is_closed() && core.available > 0 {
			let unused = core.forfeit();

			self.metrics.record_forfeited(unused);
			obs::log_forfeited(unused, now);
		}

		self.transition(SchedulerState::Draining, SchedulerState::Idle);

		admitted
	}

	fn dispatch(&self, pending: Pending, now: Duration, dispatched: u64) {
		let Pending { request, admit } = pending;

		self.metrics.record_admitted();
		obs::log_admitted(&request, now, dispatched);
		self.notify(&Event::RequestSent { request: request.clone() });

		let call = self.transport.execute(request.clone());
		let scheduler = self.this.upgrade();
		let settled = request.clone();
		let response = self.runtime.spawn(async move {
			let result = call.await;

			if let Some(scheduler) = scheduler {
				scheduler.settle(settled, &result, now);
			}

			result
		});

		// The call is already running; a producer that went away simply never reads the result.
		let _ = admit.send(Admission { request, response, admitted_at: now });
	}

	/// Publishes the completion event of an admitted request.
	fn settle(
		&self,
		request: Request,
		result: &Result<Response, TransportError>,
		admitted_at: Duration,
	) {
		let event = match result {
			Ok(response) => {
				obs::record_request_outcome(RequestOutcome::Completed);

				Event::ResponseReceived {
					request,
					status: response.status,
					latency: self.clock.elapsed() - admitted_at,
				}
			},
			Err(e) => {
				obs::record_request_outcome(RequestOutcome::Failed);

				Event::RequestFailed { request, reason: e.to_string() }
			},
		};

		self.notify(&event);
	}

	fn transition(&self, from: SchedulerState, to: SchedulerState) {
		let _ = self.state.compare_exchange(
			from.as_u8(),
			to.as_u8(),
			Ordering::AcqRel,
			Ordering::Acquire,
		);
	}
}
impl Debug for Scheduler {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Scheduler")
			.field("state", &self.state())
			.field("queued", &self.queued())
			.field("dispatched", &self.dispatched())
			.field("bus", &self.bus)
			.finish()
	}
}
