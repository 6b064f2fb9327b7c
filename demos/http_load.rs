//! Ramps real HTTP traffic against a target URL using the default reqwest transport.
//!
//! ```sh
//! cargo run --example http_load -- http://localhost:8080/health
//! ```

// std
use std::env;
// crates.io
use color_eyre::{Result, eyre::eyre};
// self
use paced_client::{Client, Event, RateLimitConfig, time::Duration};

const SCENARIOS: usize = 50;

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let target = env::args().nth(1).ok_or_else(|| eyre!("Usage: http_load <url>"))?;
	let client = Client::builder()
		.rate_limit(RateLimitConfig::new(1., 20., Duration::seconds(30)))
		.tick_interval(Duration::milliseconds(50))
		.add_listener(|event| match event {
			Event::ResponseReceived { request, status, latency } =>
				println!("{request} -> {status} in {:.3}s", latency.as_seconds_f64()),
			Event::RequestFailed { request, reason } => println!("{request} failed: {reason}"),
			_ => {},
		})
		.build()?;

	tokio::spawn(client.drive());

	let mut scenarios = Vec::with_capacity(SCENARIOS);

	for _ in 0..SCENARIOS {
		let client = client.clone();
		let target = target.clone();

		scenarios.push(tokio::spawn(async move {
			while !client.is_closed() {
				if client.url(&target).get().await.is_err() {
					break;
				}
			}
		}));
	}

	tokio::time::sleep(std::time::Duration::from_secs(45)).await;
	client.close();

	for scenario in scenarios {
		scenario.await?;
	}

	println!("admitted {} requests", client.dispatched());

	Ok(())
}
