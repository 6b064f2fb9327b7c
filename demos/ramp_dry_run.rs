//! Prints the admission curve of a 0 → 10 rps ramp over ten seconds without touching the network.
//!
//! 1. Build a client on a [`ManualClock`] with the [`EchoTransport`].
//! 2. Spawn scenarios that chain three requests each, feeding every response into the next URL.
//! 3. Advance virtual time one second at a time and print the cumulative admissions.

// crates.io
use color_eyre::Result;
// self
use paced_client::{
	Client, EchoTransport, EventRecorder, ManualClock, RateLimitConfig, time::Duration,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let clock = ManualClock::new();
	let recorder = EventRecorder::default();
	let client = Client::builder()
		.rate_limit(RateLimitConfig::new(0., 10., Duration::seconds(10)))
		.clock(clock.clone())
		.transport(EchoTransport::default())
		.add_listener(recorder.listener())
		.build()?;

	for _ in 0..200 {
		tokio::spawn(scenario(client.clone()));
	}

	settle().await;

	for second in 0..=12 {
		println!("t={second:>2}s admitted={:>3}", recorder.sent_count());

		clock.advance(Duration::SECOND);
		settle().await;
	}

	client.close();

	Ok(())
}

async fn scenario(client: Client) -> paced_client::Result<()> {
	let first = client.url("http://localhost:8080/foo").get().await?;
	let second = client.url(format!("http://localhost:8080/foo?page={}", first.status)).get().await?;

	client.url(format!("http://localhost:8080/foo?page={}", second.status)).get().await?;

	Ok(())
}

async fn settle() {
	for _ in 0..16 {
		tokio::task::yield_now().await;
	}
}
