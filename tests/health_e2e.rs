//! Provider health E2E tests

mod mocks;

use coverage_aggregator::mocks::MockCoverageAdapter;
use coverage_aggregator::{EngineBuilder, EngineError, HealthReport, HealthStatus, Technology};
use mocks::{Locations, MockConfigs};

#[tokio::test]
async fn test_all_providers_start_healthy() {
	let settings =
		MockConfigs::with_providers(vec![MockConfigs::circletel(), MockConfigs::dfa_elsewhere()]);
	let engine = EngineBuilder::from_settings(settings).build().unwrap();

	match engine.get_health(None).unwrap() {
		HealthReport::All(records) => {
			assert_eq!(records.len(), 2);
			assert!(records.values().all(|r| r.status == HealthStatus::Healthy));
			assert!(records.values().all(|r| r.last_request_at.is_none()));
		},
		other => panic!("Expected all providers, got {:?}", other),
	}
}

#[tokio::test(start_paused = true)]
async fn test_failure_streak_degrades_then_fails_provider() {
	let mtn = MockCoverageAdapter::failing("MTN", [Technology::FourG], 6);
	let engine = EngineBuilder::from_settings(MockConfigs::test_settings())
		.with_adapter(mtn.clone().into_adapter())
		.build()
		.unwrap();
	let (lat, lng) = Locations::JOHANNESBURG;

	for _ in 0..3 {
		engine.check_provider("MTN", lat, lng).await.unwrap();
	}
	let HealthReport::Provider(record) = engine.get_health(Some("MTN")).unwrap() else {
		panic!("Expected a single provider record");
	};
	assert_eq!(record.status, HealthStatus::Healthy);
	assert_eq!(record.consecutive_failures, 3);

	engine.check_provider("MTN", lat, lng).await.unwrap();
	let HealthReport::Provider(record) = engine.get_health(Some("MTN")).unwrap() else {
		panic!("Expected a single provider record");
	};
	assert_eq!(record.status, HealthStatus::Degraded);
	assert_eq!(record.success_rate, 0.0);

	for _ in 0..7 {
		engine.check_provider("MTN", lat, lng).await.unwrap();
	}
	let HealthReport::Provider(record) = engine.get_health(Some("MTN")).unwrap() else {
		panic!("Expected a single provider record");
	};
	assert_eq!(record.status, HealthStatus::Unhealthy);
	assert_eq!(record.consecutive_failures, 11);

	// Unhealthy providers are still queried
	assert_eq!(mtn.call_count(), 11);
}

#[tokio::test(start_paused = true)]
async fn test_unhealthy_provider_still_part_of_aggregation() {
	let mtn = MockCoverageAdapter::failing("MTN", [Technology::FourG], 6);
	let vuma = MockCoverageAdapter::covered("Vuma", [Technology::Fibre], 7, 85);
	let engine = EngineBuilder::from_settings(MockConfigs::test_settings())
		.with_adapter(mtn.clone().into_adapter())
		.with_adapter(vuma.into_adapter())
		.build()
		.unwrap();

	for step in 0..12 {
		let lat = -29.80 - step as f64 * 0.01;
		engine
			.check_coverage(coverage_aggregator::CoverageQuery::new(lat, 31.02))
			.await
			.unwrap();
	}

	assert_eq!(mtn.call_count(), 12);
	let HealthReport::Provider(mtn_health) = engine.get_health(Some("MTN")).unwrap() else {
		panic!("Expected a single provider record");
	};
	let HealthReport::Provider(vuma_health) = engine.get_health(Some("Vuma")).unwrap() else {
		panic!("Expected a single provider record");
	};
	assert_eq!(mtn_health.status, HealthStatus::Unhealthy);
	assert_eq!(vuma_health.status, HealthStatus::Healthy);
	assert_eq!(vuma_health.window_requests, 12);
}

#[tokio::test]
async fn test_unknown_provider_health() {
	let engine = EngineBuilder::from_settings(MockConfigs::test_settings())
		.build()
		.unwrap();

	let error = engine.get_health(Some("Telkom")).unwrap_err();
	assert!(matches!(error, EngineError::UnknownProvider { ref name } if name == "Telkom"));
}

#[tokio::test(start_paused = true)]
async fn test_health_report_serializes_flat() {
	let mtn = MockCoverageAdapter::failing("MTN", [Technology::FourG], 6);
	let engine = EngineBuilder::from_settings(MockConfigs::test_settings())
		.with_adapter(mtn.into_adapter())
		.build()
		.unwrap();
	let (lat, lng) = Locations::PRETORIA;
	for _ in 0..4 {
		engine.check_provider("MTN", lat, lng).await.unwrap();
	}

	let single = serde_json::to_value(engine.get_health(Some("MTN")).unwrap()).unwrap();
	assert_eq!(single["provider"], "MTN");
	assert_eq!(single["status"], "degraded");
	assert_eq!(single["consecutiveFailures"], 4);

	let all = serde_json::to_value(engine.get_health(None).unwrap()).unwrap();
	assert_eq!(all["MTN"]["status"], "degraded");
}

#[tokio::test(start_paused = true)]
async fn test_failure_streak_raises_one_alert_per_cooldown() {
	let mtn = MockCoverageAdapter::failing("MTN", [Technology::FourG], 6);
	let engine = EngineBuilder::from_settings(MockConfigs::test_settings())
		.with_adapter(mtn.into_adapter())
		.build()
		.unwrap();
	let (lat, lng) = Locations::BLOEMFONTEIN;

	for _ in 0..4 {
		engine.check_provider("MTN", lat, lng).await.unwrap();
	}
	assert!(engine.recent_alerts().is_empty());

	for _ in 0..4 {
		engine.check_provider("MTN", lat, lng).await.unwrap();
	}
	let alerts = engine.recent_alerts();
	assert_eq!(alerts.len(), 1);
	assert_eq!(alerts[0].provider, "MTN");
	assert_eq!(alerts[0].messages, vec!["5 consecutive failures detected"]);

	engine.reset_alerts();
	assert!(engine.recent_alerts().is_empty());
}
