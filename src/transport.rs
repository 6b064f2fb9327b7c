//! Transport seam invoked once per admitted request.
//!
//! The scheduler treats the transport as an opaque asynchronous operation: it calls
//! [`Transport::execute`] at admission time and spawns the returned future right away, so the
//! request goes out on schedule even if its producer never polls the handle. Failures reach that
//! producer and the event bus only; they never affect admission accounting and are never retried
//! here.

// std
use std::sync::atomic::{AtomicU64, Ordering};
// self
use crate::{
	_prelude::*,
	error::TransportError,
	request::{Request, Response},
};
#[cfg(feature = "reqwest")] use crate::error::ConfigError;

/// Boxed future returned by [`Transport::execute`].
pub type TransportFuture = Pin<Box<dyn Future<Output = Result<Response, TransportError>> + Send>>;

/// Executes admitted requests.
///
/// Implementations must own whatever state the returned future needs so the future can outlive
/// the call and move across executor threads.
pub trait Transport
where
	Self: 'static + Send + Sync,
{
	/// Starts executing `request`.
	fn execute(&self, request: Request) -> TransportFuture;
}

/// Adapts a closure returning a future into a [`Transport`].
#[derive(Clone)]
pub struct FnTransport<F>(F);
impl<F, Fut> FnTransport<F>
where
	F: 'static + Fn(Request) -> Fut + Send + Sync,
	Fut: 'static + Future<Output = Result<Response, TransportError>> + Send,
{
	/// Wraps `f`.
	pub fn new(f: F) -> Self {
		Self(f)
	}
}
impl<F, Fut> Transport for FnTransport<F>
where
	F: 'static + Fn(Request) -> Fut + Send + Sync,
	Fut: 'static + Future<Output = Result<Response, TransportError>> + Send,
{
	fn execute(&self, request: Request) -> TransportFuture {
		Box::pin((self.0)(request))
	}
}
impl<F> Debug for FnTransport<F> {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("FnTransport(..)")
	}
}

/// Dry-run transport answering every request immediately with `200` and the request URL as the
/// body.
///
/// Useful for exercising a rate schedule without touching the network.
#[derive(Clone, Debug, Default)]
pub struct EchoTransport {
	calls: Arc<AtomicU64>,
}
impl EchoTransport {
	/// Number of requests executed so far.
	pub fn calls(&self) -> u64 {
		self.calls.load(Ordering::Relaxed)
	}
}
impl Transport for EchoTransport {
	fn execute(&self, request: Request) -> TransportFuture {
		self.calls.fetch_add(1, Ordering::Relaxed);

		Box::pin(async move {
			Ok(Response {
				request_id: request.id(),
				status: 200,
				body: request.url().as_str().as_bytes().to_vec(),
			})
		})
	}
}

/// Transport backed by a shared [`ReqwestClient`].
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransport(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestTransport {
	/// Builds a transport with a freshly configured reqwest client.
	pub fn new() -> Result<Self, ConfigError> {
		Ok(Self(ReqwestClient::builder().build()?))
	}

	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
#[cfg(feature = "reqwest")]
impl Transport for ReqwestTransport {
	fn execute(&self, request: Request) -> TransportFuture {
		let client = self.0.clone();

		Box::pin(async move {
			let response =
				client.request(request.method().into(), request.url().clone()).send().await?;
			let status = response.status().as_u16();
			let body = response.bytes().await?.to_vec();

			Ok(Response { request_id: request.id(), status, body })
		})
	}
}
