//! Awaitable handle a producer holds while its request is queued and in flight.

// std
use std::task::{Context, Poll};
// crates.io
use tokio::sync::oneshot;
// self
use crate::{
	_prelude::*,
	error::TransportError,
	request::{RequestId, Response},
	scheduler::{Admission, ResponseTask, Scheduler},
};

/// Future resolving to the transport's [`Response`] for one request.
///
/// The request is already queued when the handle is created. Awaiting it first waits for the
/// scheduler to admit the request, then for the transport call the scheduler spawned at
/// admission. Dropping the handle while the request is still queued withdraws it without
/// consuming budget; once admitted, the call runs to completion whether or not the handle is
/// awaited.
#[must_use = "dropping a ResponseHandle cancels its queued request"]
pub struct ResponseHandle {
	id: Option<RequestId>,
	stage: Stage,
	scheduler: Option<Arc<Scheduler>>,
}
impl ResponseHandle {
	pub(crate) fn queued(
		id: RequestId,
		admission: oneshot::Receiver<Admission>,
		scheduler: Arc<Scheduler>,
	) -> Self {
		Self { id: Some(id), stage: Stage::Queued(admission), scheduler: Some(scheduler) }
	}

	pub(crate) fn failed(error: Error) -> Self {
		Self { id: None, stage: Stage::Failed(Some(error)), scheduler: None }
	}

	/// Identifier of the underlying request; `None` if the request was never created.
	pub fn id(&self) -> Option<RequestId> {
		self.id
	}

	/// Withdraws the request if it is still queued.
	///
	/// Returns `false` when the request was already admitted (or never queued); the handle then
	/// keeps resolving normally. After a successful cancel the handle resolves to
	/// [`Error::Cancelled`].
	pub fn cancel(&mut self) -> bool {
		let (Some(id), Some(scheduler), Stage::Queued(_)) = (self.id, &self.scheduler, &self.stage)
		else {
			return false;
		};

		if !scheduler.cancel(id) {
			return false;
		}

		self.stage = Stage::Failed(Some(Error::Cancelled { id }));

		true
	}
}
impl Future for ResponseHandle {
	type Output = Result<Response>;

	fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
		let this = &mut *self;

		loop {
			match &mut this.stage {
				Stage::Queued(rx) => match Pin::new(rx).poll(cx) {
					Poll::Ready(Ok(Admission { response, .. })) => {
						this.stage = Stage::InFlight(response);
					},
					Poll::Ready(Err(_)) => {
						this.stage = Stage::Done;

						return Poll::Ready(Err(Error::Closed));
					},
					Poll::Pending => return Poll::Pending,
				},
				Stage::InFlight(task) => {
					let Poll::Ready(joined) = Pin::new(task).poll(cx) else {
						return Poll::Pending;
					};
					let result = match joined {
						Ok(result) => result.map_err(Error::from),
						// The call panicked or its runtime shut down.
						Err(e) => Err(TransportError::other(e.to_string()).into()),
					};

					this.stage = Stage::Done;

					return Poll::Ready(result);
				},
				Stage::Failed(error) => {
					let error = error.take().unwrap_or(Error::Closed);

					this.stage = Stage::Done;

					return Poll::Ready(Err(error));
				},
				Stage::Done => panic!("`ResponseHandle` polled after completion"),
			}
		}
	}
}
impl Drop for ResponseHandle {
	fn drop(&mut self) {
		if let (Some(id), Some(scheduler), Stage::Queued(_)) = (self.id, &self.scheduler, &self.stage)
		{
			scheduler.cancel(id);
		}
	}
}
impl Debug for ResponseHandle {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ResponseHandle")
			.field("id", &self.id)
			.field("stage", &self.stage.label())
			.finish()
	}
}

enum Stage {
	Queued(oneshot::Receiver<Admission>),
	InFlight(ResponseTask),
	Failed(Option<Error>),
	Done,
}
impl Stage {
	const fn label(&self) -> &'static str {
		match self {
			Stage::Queued(_) => "queued",
			Stage::InFlight(_) => "in_flight",
			Stage::Failed(_) => "failed",
			Stage::Done => "done",
		}
	}
}
