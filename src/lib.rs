//! Admission-control core for load generators. Shapes requests issued by many concurrent
//! scenarios into a constant or linearly ramped rate, with deterministic virtual time and
//! ordered dispatch events.
//!
//! The crate is organized leaves first:
//!
//! - [`clock`] supplies elapsed time ([`clock::SystemClock`] for real runs,
//!   [`clock::ManualClock`] for deterministic tests).
//! - [`rate`] maps elapsed time to the instantaneous allowed rate.
//! - [`scheduler`] converts that rate into an integer admission budget and releases queued
//!   requests in FIFO order.
//! - [`event`] fans dispatch notifications out to listeners.
//! - [`client`] is the facade producers call: `client.url("...").get().await`.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod client;
pub mod clock;
pub mod config;
pub mod error;
pub mod event;
pub mod obs;
pub mod rate;
pub mod request;
pub mod scheduler;
pub mod transport;

pub use client::{Client, ClientBuilder, RequestBuilder, ResponseHandle};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ClientConfig, RateLimitConfig};
pub use error::{ConfigError, Error, ListenerError, Result, TransportError};
pub use event::{Event, EventBus, EventRecorder};
pub use request::{Method, Request, RequestId, Response};
#[cfg(feature = "reqwest")] pub use transport::ReqwestTransport;
pub use transport::{EchoTransport, FnTransport, Transport, TransportFuture};

mod _prelude {
	pub use std::{
		collections::VecDeque,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
	};

	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::Duration;
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use time;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _};
