#![allow(dead_code)]

// self
use paced_client::{
	Client, EchoTransport, EventRecorder, ManualClock, RateLimitConfig, Response, Result,
};

pub const BASE_URL: &str = "http://localhost:8080/foo";

/// Client wired to a manual clock, the echo transport, and an event recorder.
pub struct Harness {
	pub client: Client,
	pub clock: ManualClock,
	pub recorder: EventRecorder,
	pub transport: EchoTransport,
}

pub fn harness(rate_limit: RateLimitConfig) -> Harness {
	let clock = ManualClock::new();
	let recorder = EventRecorder::default();
	let transport = EchoTransport::default();
	let client = Client::builder()
		.rate_limit(rate_limit)
		.clock(clock.clone())
		.transport(transport.clone())
		.add_listener(recorder.listener())
		.build()
		.expect("Test client should build with a valid rate limit.");

	Harness { client, clock, recorder, transport }
}

/// Three causally chained requests, each URL derived from the previous response.
pub async fn scenario(client: Client) -> Result<Response> {
	let first = client.url(BASE_URL).get().await?;
	let second = client.url(format!("{BASE_URL}?page={}", first.status)).get().await?;

	client.url(format!("{BASE_URL}?page={}", second.status)).get().await
}

/// Lets every woken task on the current-thread runtime run to its next suspension point.
pub async fn settle() {
	for _ in 0..16 {
		tokio::task::yield_now().await;
	}
}
