//! Immutable client configuration validated once at construction.

// crates.io
use serde::{Deserializer, Serializer};
// self
use crate::{_prelude::*, error::ConfigError};

/// Rate limit applied by the scheduler: a linear ramp from `start_rate` to `target_rate` over
/// `ramp_duration`, holding `target_rate` afterwards.
///
/// Rates are expressed in requests per second. Equal start and target rates describe a constant
/// rate; a very large `ramp_duration` approximates a constant `start_rate`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RateLimitConfig {
	start_rate: f64,
	target_rate: f64,
	#[serde(with = "seconds")]
	ramp_duration: Duration,
}
impl RateLimitConfig {
	/// Ramp length used by [`RateLimitConfig::constant`]; irrelevant because both ends match.
	pub const CONSTANT_RAMP: Duration = Duration::SECOND;
	/// Highest accepted rate in requests per second.
	///
	/// Keeps the integrated budget far below `u64::MAX` for any realistic run length.
	pub const MAX_RATE: f64 = 1e9;

	/// Creates a ramp from `start_rate` to `target_rate` over `ramp_duration`.
	pub fn new(start_rate: f64, target_rate: f64, ramp_duration: Duration) -> Self {
		Self { start_rate, target_rate, ramp_duration }
	}

	/// Creates a constant-rate configuration.
	pub fn constant(rate: f64) -> Self {
		Self::new(rate, rate, Self::CONSTANT_RAMP)
	}

	/// Initial instantaneous rate.
	pub fn start_rate(&self) -> f64 {
		self.start_rate
	}

	/// Steady-state rate held once the ramp has elapsed.
	pub fn target_rate(&self) -> f64 {
		self.target_rate
	}

	/// Time taken to interpolate between the start and target rates.
	pub fn ramp_duration(&self) -> Duration {
		self.ramp_duration
	}

	/// Returns `true` when the ramp collapses to a constant rate.
	pub fn is_constant(&self) -> bool {
		self.start_rate == self.target_rate
	}

	/// Validates rates and ramp duration.
	pub fn validate(&self) -> Result<(), ConfigError> {
		validate_rate("start_rate", self.start_rate)?;
		validate_rate("target_rate", self.target_rate)?;

		if !self.ramp_duration.is_positive() {
			return Err(ConfigError::NonPositiveRampDuration { duration: self.ramp_duration });
		}

		Ok(())
	}
}

/// Complete client configuration, loadable from JSON.
///
/// ```json
/// { "rate_limit": { "start_rate": 0, "target_rate": 10, "ramp_duration": 10 }, "tick_interval": 0.1 }
/// ```
///
/// Durations are written as (fractional) seconds.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
	/// Admission rate schedule.
	pub rate_limit: RateLimitConfig,
	/// Period of the real-time ticker started by [`Client::drive`](crate::Client::drive).
	#[serde(with = "seconds", default = "ClientConfig::default_tick_interval")]
	pub tick_interval: Duration,
}
impl ClientConfig {
	/// Tick period used when none is configured.
	pub const DEFAULT_TICK_INTERVAL: Duration = Duration::milliseconds(100);

	/// Creates a configuration with the default tick interval.
	pub fn new(rate_limit: RateLimitConfig) -> Self {
		Self { rate_limit, tick_interval: Self::DEFAULT_TICK_INTERVAL }
	}

	/// Overrides the tick interval.
	pub fn with_tick_interval(mut self, tick_interval: Duration) -> Self {
		self.tick_interval = tick_interval;

		self
	}

	/// Parses and validates a JSON document.
	pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
		let mut de = serde_json::Deserializer::from_str(raw);

		Self::decode(&mut de)
	}

	/// Parses and validates a JSON byte slice.
	pub fn from_json_slice(raw: &[u8]) -> Result<Self, ConfigError> {
		let mut de = serde_json::Deserializer::from_slice(raw);

		Self::decode(&mut de)
	}

	/// Validates every nested setting.
	pub fn validate(&self) -> Result<(), ConfigError> {
		self.rate_limit.validate()?;

		if !self.tick_interval.is_positive() {
			return Err(ConfigError::NonPositiveTickInterval { duration: self.tick_interval });
		}

		Ok(())
	}

	fn decode<'de, R>(de: &mut serde_json::Deserializer<R>) -> Result<Self, ConfigError>
	where
		R: serde_json::de::Read<'de>,
	{
		let config: Self = serde_path_to_error::deserialize(&mut *de)?;

		de.end().map_err(|source| ConfigError::TrailingCharacters { source })?;
		config.validate()?;

		Ok(config)
	}

	fn default_tick_interval() -> Duration {
		Self::DEFAULT_TICK_INTERVAL
	}
}

fn validate_rate(field: &'static str, value: f64) -> Result<(), ConfigError> {
	if !value.is_finite() {
		return Err(ConfigError::NonFiniteRate { field, value });
	}
	if value < 0. {
		return Err(ConfigError::NegativeRate { field, value });
	}
	if value > RateLimitConfig::MAX_RATE {
		return Err(ConfigError::RateTooHigh { field, value, max: RateLimitConfig::MAX_RATE });
	}

	Ok(())
}

/// Serializes [`Duration`] values as fractional seconds.
mod seconds {
	// crates.io
	use serde::de::Error as _;
	// self
	use super::*;

	// Roughly 31 million years; keeps `Duration::seconds_f64` clear of overflow.
	const MAX_SECONDS: f64 = 1e15;

	pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_f64(duration.as_seconds_f64())
	}

	pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
	where
		D: Deserializer<'de>,
	{
		let secs = f64::deserialize(deserializer)?;

		if !secs.is_finite() || secs.abs() > MAX_SECONDS {
			return Err(D::Error::custom(format!("{secs} is not a representable duration")));
		}

		Ok(Duration::seconds_f64(secs))
	}
}
