mod common;

// self
use common::*;
use paced_client::{RateLimitConfig, time::Duration};

#[tokio::test]
async fn constant_rate_of_one_per_second() {
	let Harness { client, clock, recorder, .. } =
		harness(RateLimitConfig::new(1., 1., Duration::seconds(1_000)));

	// Several scenarios keep demand above the rate even while one waits on its response.
	for _ in 0..3 {
		tokio::spawn(scenario(client.clone()));
	}

	settle().await;

	for expected in 0..=8 {
		assert_eq!(recorder.sent_count(), expected, "admissions after {expected}s");
		assert_eq!(client.dispatched(), expected as u64);

		clock.advance(Duration::SECOND);
		settle().await;
	}
}

#[tokio::test]
async fn ramp_from_zero_to_ten_over_ten_seconds_then_hold() {
	let Harness { client, clock, recorder, .. } =
		harness(RateLimitConfig::new(0., 10., Duration::seconds(10)));

	for _ in 0..200 {
		tokio::spawn(scenario(client.clone()));
	}

	settle().await;

	let expected = [0, 1, 3, 6, 10, 15, 21, 28, 36, 45, 55, 65, 75];

	for (second, expected) in expected.into_iter().enumerate() {
		assert_eq!(recorder.sent_count(), expected, "admissions after {second}s");

		clock.advance(Duration::SECOND);
		settle().await;
	}
}

#[tokio::test]
async fn ramp_matches_closed_form_with_eager_demand() {
	const RATE: u64 = 4;
	const RAMP_SECS: u64 = 4;

	let Harness { client, clock, recorder, .. } =
		harness(RateLimitConfig::new(0., RATE as f64, Duration::seconds(RAMP_SECS as i64)));
	let handles = (0..100).map(|_| client.url(BASE_URL).get()).collect::<Vec<_>>();

	for t in 1..=8_u64 {
		clock.advance(Duration::SECOND);

		let expected = if t <= RAMP_SECS {
			RATE * t * (t + 1) / (2 * RAMP_SECS)
		} else {
			RATE * (RAMP_SECS + 1) / 2 + RATE * (t - RAMP_SECS)
		};

		assert_eq!(recorder.sent_count() as u64, expected, "admissions after {t}s");
	}

	assert_eq!(client.queued(), 100 - recorder.sent_count());

	drop(handles);
}

#[tokio::test]
async fn fractional_rate_holds_long_run_average() {
	let Harness { clock, recorder, client, .. } = harness(RateLimitConfig::constant(0.5));
	let handles = (0..20).map(|_| client.url(BASE_URL).get()).collect::<Vec<_>>();
	let mut previous = 0;

	for t in 1..=20 {
		clock.advance(Duration::SECOND);

		let sent = recorder.sent_count();

		assert!(sent >= previous, "admissions must never decrease");
		assert_eq!(sent, t / 2);

		previous = sent;
	}

	drop(handles);
}

#[tokio::test]
async fn sub_second_ticks_converge_to_the_configured_rate() {
	let Harness { client, clock, recorder, .. } = harness(RateLimitConfig::constant(3.));
	let handles = (0..50).map(|_| client.url(BASE_URL).get()).collect::<Vec<_>>();

	for _ in 0..40 {
		clock.advance(Duration::milliseconds(250));
	}

	assert_eq!(recorder.sent_count(), 30);
	assert_eq!(client.elapsed(), Duration::seconds(10));

	drop(handles);
}
