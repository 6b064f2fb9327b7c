//! Public facade producers use to issue paced requests.

mod builder;
mod handle;

pub use builder::*;
pub use handle::*;

// std
use std::{
	sync::atomic::{AtomicU64, Ordering},
	time::Duration as StdDuration,
};
// crates.io
use tokio::{
	sync::oneshot,
	time::{MissedTickBehavior, interval},
};
// self
use crate::{
	_prelude::*,
	clock::Clock,
	config::ClientConfig,
	event::Event,
	obs::SchedulerMetrics,
	request::{Method, Request, RequestId},
	scheduler::{Pending, Scheduler, SchedulerState},
};

/// Load-generation client that admits requests at the configured rate.
///
/// Cloning is cheap and every clone shares the same scheduler, so each scenario task can own
/// one. Dropping the last clone closes the client; requests still queued then resolve with
/// [`Error::Closed`].
///
/// ```no_run
/// # async fn demo(client: paced_client::Client) -> paced_client::Result<()> {
/// let first = client.url("http://localhost:8080/foo").get().await?;
/// let next = client.url(format!("http://localhost:8080/foo?page={}", first.status)).get().await?;
/// # let _ = next;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Client(Arc<ClientInner>);
impl Client {
	/// Starts configuring a client.
	pub fn builder() -> ClientBuilder {
		ClientBuilder::new()
	}

	/// Begins a request to `value`; pick the verb on the returned builder.
	pub fn url(&self, value: impl AsRef<str>) -> RequestBuilder<'_> {
		RequestBuilder::new(self, Url::parse(value.as_ref()))
	}

	/// Creates and enqueues a request immediately, returning the handle that resolves once the
	/// transport completes it.
	pub fn request(&self, method: Method, url: Url) -> ResponseHandle {
		let inner = &self.0;
		let id = RequestId::new(inner.next_id.fetch_add(1, Ordering::Relaxed));
		let request = Request::new(id, method, url, inner.scheduler.elapsed());
		let (tx, rx) = oneshot::channel();

		match inner.scheduler.enqueue(Pending::new(request, tx)) {
			Ok(()) => ResponseHandle::queued(id, rx, Arc::clone(&inner.scheduler)),
			Err(e) => ResponseHandle::failed(e),
		}
	}

	/// Registers a listener that receives every subsequent [`Event`].
	pub fn add_listener<F>(&self, listener: F)
	where
		F: 'static + Fn(&Event) + Send + Sync,
	{
		self.0.scheduler.add_listener(listener);
	}

	/// Runs one explicit scheduler wake, returning how many requests were admitted.
	pub fn poll(&self) -> u64 {
		self.0.scheduler.wake()
	}

	/// Closes the client; queued requests resolve with [`Error::Closed`] and new ones are
	/// rejected.
	pub fn close(&self) {
		self.0.scheduler.close();
	}

	/// Returns `true` once the client has been closed.
	pub fn is_closed(&self) -> bool {
		self.0.scheduler.is_closed()
	}

	/// Drives the scheduler from real time, waking it every configured tick interval.
	///
	/// Spawn the returned future on a tokio runtime when using a [`SystemClock`]. It only holds a
	/// weak reference, so it finishes once the client is closed or every clone is dropped.
	///
	/// [`SystemClock`]: crate::clock::SystemClock
	pub fn drive(&self) -> impl Future<Output = ()> + Send + 'static {
		let period = StdDuration::try_from(self.0.config.tick_interval)
			.unwrap_or(StdDuration::from_millis(100));
		let weak = Arc::downgrade(&self.0);

		async move {
			let mut ticker = interval(period);

			ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

			loop {
				ticker.tick().await;

				let Some(inner) = weak.upgrade() else {
					break;
				};

				if inner.scheduler.is_closed() {
					break;
				}

				inner.scheduler.wake();
			}
		}
	}

	/// Requests admitted so far.
	pub fn dispatched(&self) -> u64 {
		self.0.scheduler.dispatched()
	}

	/// Requests waiting for budget.
	pub fn queued(&self) -> usize {
		self.0.scheduler.queued()
	}

	/// Scheduler lifecycle state.
	pub fn state(&self) -> SchedulerState {
		self.0.scheduler.state()
	}

	/// Activity counters.
	pub fn metrics(&self) -> &SchedulerMetrics {
		self.0.scheduler.metrics()
	}

	/// Validated configuration the client was built with.
	pub fn config(&self) -> &ClientConfig {
		&self.0.config
	}

	/// Elapsed time on the client's clock.
	pub fn elapsed(&self) -> Duration {
		self.0.scheduler.elapsed()
	}

	fn from_parts(config: ClientConfig, clock: Arc<dyn Clock>, scheduler: Arc<Scheduler>) -> Self {
		let weak = Arc::downgrade(&scheduler);

		// Manual clocks re-trigger scheduling on every advance; real clocks ignore the hook.
		clock.on_advance(Arc::new(move || match weak.upgrade() {
			Some(scheduler) if !scheduler.is_closed() => {
				scheduler.wake();

				true
			},
			_ => false,
		}));

		Self(Arc::new(ClientInner { config, scheduler, next_id: AtomicU64::new(0) }))
	}
}
impl Debug for Client {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Client")
			.field("config", &self.0.config)
			.field("scheduler", &self.0.scheduler)
			.finish()
	}
}

struct ClientInner {
	config: ClientConfig,
	scheduler: Arc<Scheduler>,
	next_id: AtomicU64,
}
impl Drop for ClientInner {
	fn drop(&mut self) {
		self.scheduler.close();
	}
}

/// Builder returned by [`Client::url`]; each verb method enqueues the request.
#[derive(Debug)]
pub struct RequestBuilder<'a> {
	client: &'a Client,
	url: Result<Url, url::ParseError>,
}
impl<'a> RequestBuilder<'a> {
	fn new(client: &'a Client, url: Result<Url, url::ParseError>) -> Self {
		Self { client, url }
	}

	/// Issues the request with an explicit verb.
	pub fn method(self, method: Method) -> ResponseHandle {
		match self.url {
			Ok(url) => self.client.request(method, url),
			Err(source) => ResponseHandle::failed(Error::InvalidUrl { source }),
		}
	}

	/// Issues a `GET`.
	pub fn get(self) -> ResponseHandle {
		self.method(Method::Get)
	}

	/// Issues a `POST`.
	pub fn post(self) -> ResponseHandle {
		self.method(Method::Post)
	}

	/// Issues a `PUT`.
	pub fn put(self) -> ResponseHandle {
		self.method(Method::Put)
	}

	/// Issues a `PATCH`.
	pub fn patch(self) -> ResponseHandle {
		self.method(Method::Patch)
	}

	/// Issues a `DELETE`.
	pub fn delete(self) -> ResponseHandle {
		self.method(Method::Delete)
	}

	/// Issues a `HEAD`.
	pub fn head(self) -> ResponseHandle {
		self.method(Method::Head)
	}
}
