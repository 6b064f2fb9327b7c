//! Unbounded FIFO shared by many producers and drained by the scheduler.

// self
use crate::{_prelude::*, request::RequestId};

/// Returned by [`AdmissionQueue::enqueue`] on a closed queue, handing the item back.
#[derive(Debug)]
pub struct QueueClosed<T>(
	/// The rejected item.
	pub T,
);

/// FIFO of pending items keyed by [`RequestId`].
///
/// Producers may only append; the scheduler removes from the front. Items leave in exactly the
/// order they entered, except for cancelled items which leave without being dequeued.
#[derive(Debug)]
pub struct AdmissionQueue<T> {
	state: Mutex<QueueState<T>>,
}
impl<T> AdmissionQueue<T> {
	/// Creates an empty, open queue.
	pub fn new() -> Self {
		Self { state: Mutex::new(QueueState { items: VecDeque::new(), closed: false }) }
	}

	/// Appends `item`; never blocks. Fails only once the queue is closed.
	pub fn enqueue(&self, id: RequestId, item: T) -> Result<(), QueueClosed<T>> {
		let mut state = self.state.lock();

		if state.closed {
			return Err(QueueClosed(item));
		}

		state.items.push_back((id, item));

		Ok(())
	}

	/// Removes and returns up to `n` items from the front, preserving order.
	pub fn dequeue_up_to(&self, n: usize) -> Vec<T> {
		let mut state = self.state.lock();
		let take = n.min(state.items.len());

		state.items.drain(..take).map(|(_, item)| item).collect()
	}

	/// Removes the still-queued item with `id`. Returns `None` if it already left the queue.
	pub fn cancel(&self, id: RequestId) -> Option<T> {
		let mut state = self.state.lock();
		let position = state.items.iter().position(|(queued, _)| *queued == id)?;

		state.items.remove(position).map(|(_, item)| item)
	}

	/// Marks the queue closed and hands back everything still pending.
	pub fn close(&self) -> Vec<T> {
		let mut state = self.state.lock();

		state.closed = true;

		state.items.drain(..).map(|(_, item)| item).collect()
	}

	/// Returns `true` once [`close`](AdmissionQueue::close) has run.
	pub fn is_closed(&self) -> bool {
		self.state.lock().closed
	}

	/// Number of pending items.
	pub fn len(&self) -> usize {
		self.state.lock().items.len()
	}

	/// Returns `true` when nothing is pending.
	pub fn is_empty(&self) -> bool {
		self.state.lock().items.is_empty()
	}
}
impl<T> Default for AdmissionQueue<T> {
	fn default() -> Self {
		Self::new()
	}
}

#[derive(Debug)]
struct QueueState<T> {
	items: VecDeque<(RequestId, T)>,
	closed: bool,
}
