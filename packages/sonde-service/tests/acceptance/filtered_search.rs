use sonde_domain::{Direction, GeoPoint};
use sonde_service::{CollectionPair, GeoCircle, SearchFilter, SearchRequest, SearchStrategy};

use super::{build_service, keyword_providers, record, record_at, test_collections, test_config};

#[tokio::test]
#[ignore = "Requires external Qdrant. Set SONDE_QDRANT_URL to run."]
async fn a_direction_filter_restricts_hits_to_that_direction() {
	let Some(collections) = test_collections() else {
		eprintln!("Skipping; set SONDE_QDRANT_URL to run this test.");

		return;
	};
	let cfg = test_config(
		collections.qdrant_url().to_string(),
		4,
		collections.collection_name("sonde_records"),
		collections.collection_name("sonde_chunks"),
	);
	let pair = CollectionPair::from_config(&cfg);
	let providers = keyword_providers(4, vec!["money"]);
	let service = build_service(cfg, providers).expect("Failed to build service.");
	let records = vec![
		record("in_1", "money arrived", "x", Direction::Incoming, "2024-03-01T10:00:00"),
		record("out_1", "sending the money", "x", Direction::Outgoing, "2024-03-01T10:05:00"),
		record("in_2", "more money here", "y", Direction::Incoming, "2024-03-02T09:00:00"),
	];

	service.index_records(records, &pair, true).await.expect("Indexing failed.");

	let response = service
		.search(SearchRequest {
			query: "money".to_string(),
			collection: pair.records.clone(),
			filter: SearchFilter {
				direction: Some(Direction::Incoming),
				..SearchFilter::default()
			},
			top_k: Some(10),
			exclude_noise: None,
			strategy: Some(SearchStrategy::Exact),
		})
		.await
		.expect("Search failed.");
	let mut ids: Vec<&str> = response.items.iter().map(|item| item.id.as_str()).collect();

	ids.sort_unstable();

	assert_eq!(ids, vec!["in_1", "in_2"]);

	collections.cleanup().await.expect("Failed to clean up test collections.");
}

#[tokio::test]
#[ignore = "Requires external Qdrant. Set SONDE_QDRANT_URL to run."]
async fn a_time_window_is_applied_after_retrieval() {
	let Some(collections) = test_collections() else {
		eprintln!("Skipping; set SONDE_QDRANT_URL to run this test.");

		return;
	};
	let cfg = test_config(
		collections.qdrant_url().to_string(),
		4,
		collections.collection_name("sonde_records"),
		collections.collection_name("sonde_chunks"),
	);
	let pair = CollectionPair::from_config(&cfg);
	let providers = keyword_providers(4, vec!["drop"]);
	let service = build_service(cfg, providers).expect("Failed to build service.");
	// Nine equally relevant records spanning February through April.
	let records: Vec<_> = (0..9)
		.map(|i| {
			let month = 2 + i / 3;
			let day = 1 + i % 3;

			record(
				&format!("m{i}"),
				"drop point confirmed",
				"x",
				Direction::Incoming,
				&format!("2024-{month:02}-{day:02}T10:00:00"),
			)
		})
		.collect();

	service.index_records(records, &pair, true).await.expect("Indexing failed.");

	let response = service
		.search(SearchRequest {
			query: "drop".to_string(),
			collection: pair.records.clone(),
			filter: SearchFilter {
				time_start: Some("2024-03-01".to_string()),
				time_end: Some("2024-03-31".to_string()),
				..SearchFilter::default()
			},
			top_k: Some(5),
			exclude_noise: None,
			strategy: Some(SearchStrategy::Exact),
		})
		.await
		.expect("Search failed.");

	assert_eq!(response.items.len(), 3);

	for item in &response.items {
		let timestamp =
			item.metadata.get("timestamp").and_then(serde_json::Value::as_str).unwrap_or("");

		assert!(timestamp.starts_with("2024-03"), "Unexpected hit at {timestamp}.");
	}

	collections.cleanup().await.expect("Failed to clean up test collections.");
}

#[tokio::test]
#[ignore = "Requires external Qdrant. Set SONDE_QDRANT_URL to run."]
async fn a_geo_radius_keeps_only_nearby_records() {
	let Some(collections) = test_collections() else {
		eprintln!("Skipping; set SONDE_QDRANT_URL to run this test.");

		return;
	};
	let cfg = test_config(
		collections.qdrant_url().to_string(),
		4,
		collections.collection_name("sonde_records"),
		collections.collection_name("sonde_chunks"),
	);
	let pair = CollectionPair::from_config(&cfg);
	let providers = keyword_providers(4, vec!["meet"]);
	let service = build_service(cfg, providers).expect("Failed to build service.");
	let paris = GeoPoint { lat: 48.8566, lon: 2.3522 };
	let lyon = GeoPoint { lat: 45.7640, lon: 4.8357 };
	let records = vec![
		record_at("near", "meet me here", "x", Direction::Incoming, "2024-03-01T10:00:00", paris),
		record_at("far", "meet me there", "y", Direction::Incoming, "2024-03-01T11:00:00", lyon),
		// No coordinates at all: a geo query can never match it.
		record("nowhere", "meet later", "z", Direction::Incoming, "2024-03-01T12:00:00"),
	];

	service.index_records(records, &pair, true).await.expect("Indexing failed.");

	let response = service
		.search(SearchRequest {
			query: "meet".to_string(),
			collection: pair.records.clone(),
			filter: SearchFilter {
				geo: Some(GeoCircle { lat: paris.lat, lon: paris.lon, radius_km: 10.0 }),
				..SearchFilter::default()
			},
			top_k: Some(10),
			exclude_noise: None,
			strategy: Some(SearchStrategy::Exact),
		})
		.await
		.expect("Search failed.");
	let ids: Vec<&str> = response.items.iter().map(|item| item.id.as_str()).collect();

	assert_eq!(ids, vec!["near"]);

	collections.cleanup().await.expect("Failed to clean up test collections.");
}

#[tokio::test]
#[ignore = "Requires external Qdrant. Set SONDE_QDRANT_URL to run."]
async fn excluding_noise_never_increases_the_result_count() {
	let Some(collections) = test_collections() else {
		eprintln!("Skipping; set SONDE_QDRANT_URL to run this test.");

		return;
	};
	let cfg = test_config(
		collections.qdrant_url().to_string(),
		4,
		collections.collection_name("sonde_records"),
		collections.collection_name("sonde_chunks"),
	);
	let pair = CollectionPair::from_config(&cfg);
	let providers = keyword_providers(4, vec!["money"]);
	let service = build_service(cfg, providers).expect("Failed to build service.");
	let records = vec![
		record("a", "money talk", "x", Direction::Incoming, "2024-03-01T10:00:00"),
		record("b", "more money talk", "x", Direction::Outgoing, "2024-03-01T10:05:00"),
	];

	service.index_records(records, &pair, true).await.expect("Indexing failed.");

	let request = |exclude_noise: Option<bool>| SearchRequest {
		query: "money".to_string(),
		collection: pair.records.clone(),
		filter: SearchFilter::default(),
		top_k: Some(10),
		exclude_noise,
		strategy: Some(SearchStrategy::Exact),
	};
	let unfiltered = service.search(request(None)).await.expect("Search failed.");
	let filtered = service.search(request(Some(true))).await.expect("Search failed.");

	assert!(filtered.items.len() <= unfiltered.items.len());
	// The classifier is a passthrough today, so nothing is actually dropped.
	assert_eq!(filtered.items.len(), unfiltered.items.len());

	collections.cleanup().await.expect("Failed to clean up test collections.");
}
