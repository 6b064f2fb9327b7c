// crates.io
use tokio::runtime::Handle;
// self
use crate::{
	_prelude::*,
	client::Client,
	clock::{Clock, SystemClock},
	config::{ClientConfig, RateLimitConfig},
	error::ConfigError,
	event::{Event, EventBus},
	scheduler::Scheduler,
	transport::Transport,
};
#[cfg(feature = "reqwest")] use crate::transport::ReqwestTransport;

/// Builder for [`Client`] values.
///
/// ```no_run
/// # async fn demo() -> Result<(), paced_client::ConfigError> {
/// use paced_client::{Client, Event, RateLimitConfig, time::Duration};
///
/// let client = Client::builder()
/// 	.rate_limit(RateLimitConfig::new(0., 10., Duration::seconds(10)))
/// 	.add_listener(|event| {
/// 		if let Event::RequestSent { request } = event {
/// 			println!("sent {request}");
/// 		}
/// 	})
/// 	.build()?;
/// # let _ = client;
/// # Ok(())
/// # }
/// ```
pub struct ClientBuilder {
	rate_limit: Option<RateLimitConfig>,
	tick_interval: Duration,
	clock: Option<Arc<dyn Clock>>,
	transport: Option<Arc<dyn Transport>>,
	runtime: Option<Handle>,
	bus: EventBus,
}
impl ClientBuilder {
	/// Creates an empty builder.
	pub fn new() -> Self {
		Self {
			rate_limit: None,
			tick_interval: ClientConfig::DEFAULT_TICK_INTERVAL,
			clock: None,
			transport: None,
			runtime: None,
			bus: EventBus::default(),
		}
	}

	/// Sets the rate schedule.
	pub fn rate_limit(mut self, rate_limit: RateLimitConfig) -> Self {
		self.rate_limit = Some(rate_limit);

		self
	}

	/// Applies a complete configuration, e.g. one loaded with [`ClientConfig::from_json_str`].
	pub fn config(mut self, config: ClientConfig) -> Self {
		self.rate_limit = Some(config.rate_limit);
		self.tick_interval = config.tick_interval;

		self
	}

	/// Overrides the real-time tick interval used by [`Client::drive`].
	pub fn tick_interval(mut self, tick_interval: Duration) -> Self {
		self.tick_interval = tick_interval;

		self
	}

	/// Uses `clock` instead of a fresh [`SystemClock`].
	pub fn clock(self, clock: impl Clock + 'static) -> Self {
		self.shared_clock(Arc::new(clock))
	}

	/// Uses an already shared clock.
	pub fn shared_clock(mut self, clock: Arc<dyn Clock>) -> Self {
		self.clock = Some(clock);

		self
	}

	/// Uses `transport` for every admitted request.
	pub fn transport(self, transport: impl Transport) -> Self {
		self.shared_transport(Arc::new(transport))
	}

	/// Uses an already shared transport.
	pub fn shared_transport(mut self, transport: Arc<dyn Transport>) -> Self {
		self.transport = Some(transport);

		self
	}

	/// Spawns transport calls on `runtime` instead of the runtime current at [`build`] time.
	///
	/// Required when building outside a tokio runtime.
	///
	/// [`build`]: ClientBuilder::build
	pub fn runtime(mut self, runtime: Handle) -> Self {
		self.runtime = Some(runtime);

		self
	}

	/// Registers a listener; may be called any number of times.
	pub fn add_listener<F>(self, listener: F) -> Self
	where
		F: 'static + Fn(&Event) + Send + Sync,
	{
		self.bus.add_listener(listener);

		self
	}

	/// Validates the configuration and builds the client.
	pub fn build(self) -> Result<Client, ConfigError> {
		let rate_limit = self.rate_limit.ok_or(ConfigError::MissingRateLimit)?;
		let config = ClientConfig { rate_limit, tick_interval: self.tick_interval };

		config.validate()?;

		let runtime = match self.runtime {
			Some(runtime) => runtime,
			None => Handle::try_current().map_err(|_| ConfigError::MissingRuntime)?,
		};
		let transport = match self.transport {
			Some(transport) => transport,
			None => default_transport()?,
		};
		let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock::new()));
		let scheduler =
			Scheduler::new(&config.rate_limit, Arc::clone(&clock), transport, self.bus, runtime);

		Ok(Client::from_parts(config, clock, scheduler))
	}
}
impl Default for ClientBuilder {
	fn default() -> Self {
		Self::new()
	}
}
impl Debug for ClientBuilder {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ClientBuilder")
			.field("rate_limit", &self.rate_limit)
			.field("tick_interval", &self.tick_interval)
			.field("clock_set", &self.clock.is_some())
			.field("transport_set", &self.transport.is_some())
			.field("runtime_set", &self.runtime.is_some())
			.field("listeners", &self.bus.len())
			.finish()
	}
}

#[cfg(feature = "reqwest")]
fn default_transport() -> Result<Arc<dyn Transport>, ConfigError> {
	Ok(Arc::new(ReqwestTransport::new()?))
}

#[cfg(not(feature = "reqwest"))]
fn default_transport() -> Result<Arc<dyn Transport>, ConfigError> {
	Err(ConfigError::MissingTransport)
}
