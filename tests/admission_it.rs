mod common;

// std
use std::{
	sync::{
		Arc,
		atomic::{AtomicBool, AtomicUsize, Ordering},
	},
	thread,
};
// crates.io
use parking_lot::Mutex;
// self
use common::*;
use paced_client::{
	Client, Error, Event, EventRecorder, FnTransport, ManualClock, RateLimitConfig, Request,
	RequestId, Response, TransportError, scheduler::SchedulerState, time::Duration,
};

#[tokio::test]
async fn admission_is_fifo_across_concurrent_producers() {
	let Harness { client, clock, recorder, .. } = harness(RateLimitConfig::constant(100.));
	// Producers enqueue while holding this lock, so it records the global enqueue order.
	let enqueued = Arc::new(Mutex::new(Vec::new()));
	let handles = thread::scope(|scope| {
		let workers = (0..4)
			.map(|_| {
				let client = client.clone();
				let enqueued = Arc::clone(&enqueued);

				scope.spawn(move || {
					(0..50)
						.map(|_| {
							let mut enqueued = enqueued.lock();
							let handle = client.url(BASE_URL).get();

							enqueued.push(handle.id().expect("Queued handles carry an identifier."));

							handle
						})
						.collect::<Vec<_>>()
				})
			})
			.collect::<Vec<_>>();

		workers
			.into_iter()
			.flat_map(|worker| worker.join().expect("Producer thread should not panic."))
			.collect::<Vec<_>>()
	});

	assert_eq!(client.queued(), 200);

	clock.advance(Duration::SECOND);

	let enqueued = enqueued.lock().clone();

	assert_eq!(recorder.sent_ids(), enqueued[..100].to_vec());

	clock.advance(Duration::SECOND);

	assert_eq!(recorder.sent_ids(), enqueued);

	for handle in handles {
		handle.await.expect("Echo transport should never fail.");
	}
}

#[tokio::test]
async fn admitted_requests_run_without_the_handle_being_polled() {
	let clock = ManualClock::new();
	let recorder = EventRecorder::default();
	let executed = Arc::new(AtomicUsize::new(0));
	let transport_executed = Arc::clone(&executed);
	let client = Client::builder()
		.rate_limit(RateLimitConfig::constant(2.))
		.clock(clock.clone())
		.transport(FnTransport::new(move |request: Request| {
			let executed = Arc::clone(&transport_executed);

			async move {
				executed.fetch_add(1, Ordering::SeqCst);

				Ok::<_, TransportError>(Response {
					request_id: request.id(),
					status: 204,
					body: Vec::new(),
				})
			}
		}))
		.add_listener(recorder.listener())
		.build()
		.expect("Client should build.");
	let dropped = client.url(BASE_URL).get();
	let held = client.url(BASE_URL).get();

	clock.advance(Duration::SECOND);
	drop(dropped);
	settle().await;

	assert_eq!(executed.load(Ordering::SeqCst), 2);
	assert_eq!(client.dispatched(), 2);

	let received = recorder
		.events()
		.iter()
		.filter(|event| matches!(event, Event::ResponseReceived { status: 204, .. }))
		.count();

	assert_eq!(received, 2);

	let response = held.await.expect("Completed call should still reach its handle.");

	assert_eq!(response.status, 204);
	assert_eq!(executed.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn dropped_and_cancelled_handles_consume_no_budget() {
	let Harness { client, clock, recorder, .. } = harness(RateLimitConfig::constant(1.));
	let first = client.url(BASE_URL).get();
	let dropped = client.url(BASE_URL).get();
	let mut cancelled = client.url(BASE_URL).get();
	let last = client.url(BASE_URL).get();
	let dropped_id = dropped.id();
	let cancelled_id = cancelled.id().expect("Queued handles carry an identifier.");

	drop(dropped);

	assert!(cancelled.cancel());
	assert!(!cancelled.cancel());
	assert!(matches!(cancelled.await, Err(Error::Cancelled { id }) if id == cancelled_id));

	clock.advance(Duration::SECOND);
	clock.advance(Duration::SECOND);

	assert_eq!(recorder.sent_ids(), vec![first.id(), last.id()].into_iter().flatten().collect::<Vec<_>>());
	assert!(!recorder.sent_ids().iter().any(|id| Some(*id) == dropped_id));
	assert_eq!(client.dispatched(), 2);
	assert_eq!(client.metrics().cancelled(), 2);

	let response = first.await.expect("Admitted request should complete.");

	assert_eq!(response.status, 200);
	assert!(last.await.is_ok());
}

#[tokio::test]
async fn cancel_after_admission_keeps_the_response() {
	let Harness { client, clock, .. } = harness(RateLimitConfig::constant(1.));
	let mut handle = client.url(BASE_URL).get();

	clock.advance(Duration::SECOND);

	assert!(!handle.cancel());

	let response = handle.await.expect("Admitted request should still resolve.");

	assert_eq!(response.text(), BASE_URL);
}

#[tokio::test]
async fn events_are_complete_and_ordered() {
	let Harness { client, clock, recorder, transport } = harness(RateLimitConfig::constant(2.));
	let handles = (0..4).map(|_| client.url(BASE_URL).get()).collect::<Vec<_>>();

	clock.advance(Duration::SECOND);
	clock.advance(Duration::SECOND);

	for handle in handles {
		handle.await.expect("Echo transport should never fail.");
	}

	let events = recorder.events();
	let sent = events.iter().filter(|event| matches!(event, Event::RequestSent { .. })).count();
	let received =
		events.iter().filter(|event| matches!(event, Event::ResponseReceived { .. })).count();

	assert_eq!(sent as u64, client.dispatched());
	assert_eq!(received, 4);
	assert_eq!(transport.calls(), 4);
	assert_eq!(recorder.sent_ids(), (0..4).map(RequestId::new).collect::<Vec<_>>());

	for event in &events {
		if let Event::ResponseReceived { request, latency, .. } = event {
			let sent_at = events
				.iter()
				.position(|e| matches!(e, Event::RequestSent { request: r } if r.id() == request.id()));
			let received_at = events.iter().position(|e| e == event);

			assert!(sent_at < received_at);
			assert!(*latency >= Duration::ZERO);
		}
	}
}

#[tokio::test]
async fn failing_listener_does_not_disturb_others() {
	let clock = ManualClock::new();
	let recorder = EventRecorder::default();
	let client = Client::builder()
		.rate_limit(RateLimitConfig::constant(3.))
		.clock(clock.clone())
		.transport(paced_client::EchoTransport::default())
		.add_listener(|event| {
			if matches!(event, Event::RequestSent { .. }) {
				panic!("listener bug");
			}
		})
		.add_listener(recorder.listener())
		.build()
		.expect("Client should build.");
	let handles = (0..3).map(|_| client.url(BASE_URL).get()).collect::<Vec<_>>();

	clock.advance(Duration::SECOND);

	assert_eq!(recorder.sent_count(), 3);
	assert_eq!(client.metrics().listener_failures(), 3);
	assert_eq!(client.state(), SchedulerState::Idle);

	for handle in handles {
		assert!(handle.await.is_ok());
	}
}

#[tokio::test]
async fn transport_failure_reaches_only_the_producer() {
	let clock = ManualClock::new();
	let recorder = EventRecorder::default();
	let client = Client::builder()
		.rate_limit(RateLimitConfig::constant(1.))
		.clock(clock.clone())
		.transport(FnTransport::new(|_request| async {
			Err(TransportError::other("connection refused"))
		}))
		.add_listener(recorder.listener())
		.build()
		.expect("Client should build.");
	let handle = client.url(BASE_URL).get();

	clock.advance(Duration::SECOND);

	let err = handle.await.expect_err("Transport failure should surface on the handle.");

	assert!(matches!(err, Error::Transport(_)));
	assert_eq!(client.dispatched(), 1);
	assert!(recorder.events().iter().any(|event| matches!(
		event,
		Event::RequestFailed { reason, .. } if reason.contains("connection refused")
	)));
}

#[tokio::test]
async fn listener_may_enqueue_follow_up_requests() {
	let Harness { client, clock, recorder, .. } = harness(RateLimitConfig::constant(2.));
	let follow_ups = Arc::new(Mutex::new(Vec::new()));
	let fired = Arc::new(AtomicBool::new(false));
	let listener_client = client.clone();
	let listener_follow_ups = Arc::clone(&follow_ups);

	client.add_listener(move |event| {
		if matches!(event, Event::RequestSent { .. }) && !fired.swap(true, Ordering::SeqCst) {
			listener_follow_ups.lock().push(listener_client.url(BASE_URL).post());
		}
	});

	let first = client.url(BASE_URL).get();

	clock.advance(Duration::SECOND);

	assert_eq!(recorder.sent_count(), 2);
	assert!(first.await.is_ok());

	let follow_up = follow_ups.lock().pop().expect("Listener should have issued a follow-up.");

	assert!(follow_up.await.is_ok());

	client.close();
}

#[tokio::test]
async fn close_rejects_queued_and_new_requests() {
	let Harness { client, clock, recorder, .. } = harness(RateLimitConfig::constant(1.));
	let queued = client.url(BASE_URL).get();

	client.close();

	assert!(client.is_closed());
	assert_eq!(client.state(), SchedulerState::Closed);
	assert!(matches!(queued.await, Err(Error::Closed)));
	assert!(matches!(client.url(BASE_URL).get().await, Err(Error::Closed)));

	clock.advance(Duration::seconds(5));

	assert_eq!(recorder.sent_count(), 0);
	assert_eq!(client.poll(), 0);
}

#[tokio::test]
async fn invalid_url_fails_without_enqueueing() {
	let Harness { client, .. } = harness(RateLimitConfig::constant(1.));
	let handle = client.url("not a url").get();

	assert_eq!(handle.id(), None);
	assert!(matches!(handle.await, Err(Error::InvalidUrl { .. })));
	assert_eq!(client.queued(), 0);
	assert_eq!(client.metrics().enqueued(), 0);
}

#[tokio::test]
async fn dropping_every_client_closes_waiting_handles() {
	let Harness { client, clock, .. } = harness(RateLimitConfig::constant(1.));
	let handle = client.url(BASE_URL).get();

	drop(client);
	clock.advance(Duration::SECOND);

	assert!(matches!(handle.await, Err(Error::Closed)));
	assert_eq!(clock.hook_count(), 0);
}
