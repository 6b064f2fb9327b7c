// self
use paced_client::{
	Client, ClientConfig, ConfigError, EchoTransport, ManualClock, RateLimitConfig,
	time::Duration,
};

fn build(rate_limit: RateLimitConfig) -> Result<Client, ConfigError> {
	Client::builder()
		.rate_limit(rate_limit)
		.clock(ManualClock::new())
		.transport(EchoTransport::default())
		.build()
}

#[test]
fn builder_rejects_invalid_rate_limits() {
	let err = build(RateLimitConfig::new(-1., 5., Duration::SECOND))
		.expect_err("Negative start rate should fail fast.");

	assert!(matches!(err, ConfigError::NegativeRate { field: "start_rate", .. }));

	let err = build(RateLimitConfig::new(1., f64::NAN, Duration::SECOND))
		.expect_err("NaN target rate should fail fast.");

	assert!(matches!(err, ConfigError::NonFiniteRate { field: "target_rate", .. }));

	let err = build(RateLimitConfig::new(1., 5., Duration::ZERO))
		.expect_err("Zero ramp duration should fail fast.");

	assert!(matches!(err, ConfigError::NonPositiveRampDuration { .. }));

	let err = build(RateLimitConfig::constant(1e19))
		.expect_err("Rates too large to count should fail fast.");

	assert!(matches!(err, ConfigError::RateTooHigh { field: "start_rate", .. }));
}

#[test]
fn builder_requires_rate_limit_and_positive_tick() {
	let err = Client::builder()
		.transport(EchoTransport::default())
		.build()
		.expect_err("Missing rate limit should fail.");

	assert!(matches!(err, ConfigError::MissingRateLimit));

	let err = Client::builder()
		.rate_limit(RateLimitConfig::constant(1.))
		.tick_interval(Duration::ZERO)
		.transport(EchoTransport::default())
		.build()
		.expect_err("Zero tick interval should fail.");

	assert!(matches!(err, ConfigError::NonPositiveTickInterval { .. }));
}

#[test]
fn builder_needs_a_runtime_for_transport_calls() {
	let err = build(RateLimitConfig::constant(1.))
		.expect_err("Building outside a runtime without a handle should fail.");

	assert!(matches!(err, ConfigError::MissingRuntime));

	let runtime = tokio::runtime::Builder::new_current_thread()
		.enable_all()
		.build()
		.expect("Test runtime should build.");
	let client = Client::builder()
		.rate_limit(RateLimitConfig::constant(1.))
		.clock(ManualClock::new())
		.transport(EchoTransport::default())
		.runtime(runtime.handle().clone())
		.build()
		.expect("An explicit runtime handle should be accepted.");

	assert_eq!(client.dispatched(), 0);
}

#[tokio::test]
async fn json_config_drives_the_builder() {
	let config = ClientConfig::from_json_str(
		r#"{
			"rate_limit": { "start_rate": 0, "target_rate": 10, "ramp_duration": 10 },
			"tick_interval": 0.05
		}"#,
	)
	.expect("Valid JSON configuration should parse.");
	let client = Client::builder()
		.config(config)
		.clock(ManualClock::new())
		.transport(EchoTransport::default())
		.build()
		.expect("Parsed configuration should build a client.");

	assert_eq!(client.config().tick_interval, Duration::milliseconds(50));
	assert_eq!(client.config().rate_limit.target_rate(), 10.);
	assert!(!client.config().rate_limit.is_constant());
}

#[test]
fn json_errors_name_the_offending_field() {
	let err = ClientConfig::from_json_str(
		r#"{ "rate_limit": { "start_rate": "fast", "target_rate": 1, "ramp_duration": 1 } }"#,
	)
	.expect_err("String rate should not parse.");

	match err {
		ConfigError::Parse { path, .. } => assert_eq!(path, "rate_limit.start_rate"),
		other => panic!("Unexpected error: {other:?}"),
	}

	let err = ClientConfig::from_json_slice(
		br#"{ "rate_limit": { "start_rate": 1, "target_rate": 1, "ramp_duration": -2 } }"#,
	)
	.expect_err("Negative ramp should fail validation.");

	assert!(matches!(err, ConfigError::NonPositiveRampDuration { .. }));

	let err = ClientConfig::from_json_str(
		r#"{ "rate_limit": { "start_rate": 1, "target_rate": 1, "ramp_duration": 1 } } trailing"#,
	)
	.expect_err("Trailing input should be rejected.");

	assert!(matches!(err, ConfigError::TrailingCharacters { .. }));
}
