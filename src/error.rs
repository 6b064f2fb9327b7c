//! Client-level error types shared across configuration, scheduling, and transport.

// self
use crate::{_prelude::*, request::RequestId};

/// Client-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

pub(crate) type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error surfaced on a producer's response handle.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// The transport failed after the request was admitted.
	#[error(transparent)]
	Transport(#[from] TransportError),

	/// The request URL could not be parsed.
	#[error("Request URL is invalid.")]
	InvalidUrl {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// The request was withdrawn while it was still queued.
	#[error("Request {id} was cancelled before admission.")]
	Cancelled {
		/// Identifier of the withdrawn request.
		id: RequestId,
	},
	/// The client was closed before the request could be admitted.
	#[error("Client is closed and no longer admits requests.")]
	Closed,
}

/// Configuration and validation failures raised while building a client.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// A rate was below zero.
	#[error("The {field} must be non-negative, got {value}.")]
	NegativeRate {
		/// Offending field name.
		field: &'static str,
		/// Rejected value.
		value: f64,
	},
	/// A rate was NaN or infinite.
	#[error("The {field} must be finite, got {value}.")]
	NonFiniteRate {
		/// Offending field name.
		field: &'static str,
		/// Rejected value.
		value: f64,
	},
	/// A rate exceeded [`RateLimitConfig::MAX_RATE`](crate::RateLimitConfig::MAX_RATE).
	#[error("The {field} must not exceed {max} requests per second, got {value}.")]
	RateTooHigh {
		/// Offending field name.
		field: &'static str,
		/// Rejected value.
		value: f64,
		/// Largest accepted rate.
		max: f64,
	},
	/// The ramp duration was zero or negative.
	#[error("The ramp_duration must be positive, got {duration}.")]
	NonPositiveRampDuration {
		/// Rejected duration.
		duration: Duration,
	},
	/// The scheduler tick interval was zero or negative.
	#[error("The tick_interval must be positive, got {duration}.")]
	NonPositiveTickInterval {
		/// Rejected duration.
		duration: Duration,
	},
	/// The builder was finalized without a rate limit.
	#[error("A rate limit must be configured before building the client.")]
	MissingRateLimit,
	/// No transport was supplied and no default transport is compiled in.
	#[error("No transport configured; enable the `reqwest` feature or supply one.")]
	MissingTransport,
	/// The client was built outside a tokio runtime and no runtime handle was supplied.
	#[error("No tokio runtime available; build inside a runtime or supply a handle.")]
	MissingRuntime,
	/// Serialized configuration could not be decoded.
	#[error("Client configuration is malformed at `{path}`.")]
	Parse {
		/// Path to the field that failed to decode.
		path: String,
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// Serialized configuration is followed by unexpected input.
	#[error("Client configuration has trailing characters.")]
	TrailingCharacters {
		/// Decoder failure describing the trailing input.
		#[source]
		source: serde_json::Error,
	},
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
impl From<serde_path_to_error::Error<serde_json::Error>> for ConfigError {
	fn from(e: serde_path_to_error::Error<serde_json::Error>) -> Self {
		Self::Parse { path: e.path().to_string(), source: e }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures (network, IO) reported for an admitted request.
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while executing the request.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while executing the request.")]
	Io(#[from] std::io::Error),
	/// Transport-specific failure without a structured source.
	#[error("Transport failed: {message}.")]
	Other {
		/// Human-readable failure description.
		message: String,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}

	/// Builds an unstructured transport failure.
	pub fn other(message: impl Into<String>) -> Self {
		Self::Other { message: message.into() }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}

/// Failure raised inside an event listener, isolated from the scheduler and other listeners.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error("Listener #{listener} failed while handling {event}: {message}.")]
pub struct ListenerError {
	/// Registration index of the failing listener.
	pub listener: usize,
	/// Label of the event being delivered.
	pub event: &'static str,
	/// Panic payload rendered as text.
	pub message: String,
}
