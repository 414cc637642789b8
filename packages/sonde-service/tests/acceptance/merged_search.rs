use sonde_domain::Direction;
use sonde_service::{CollectionPair, MergedSearchRequest, SearchFilter, SearchStrategy};

use super::{build_service, keyword_providers, record, test_collections, test_config};

#[tokio::test]
#[ignore = "Requires external Qdrant. Set SONDE_QDRANT_URL to run."]
async fn a_higher_scoring_chunk_replaces_its_anchor_record() {
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
	let providers = keyword_providers(4, vec!["money", "cash", "beach"]);
	let service = build_service(cfg, providers).expect("Failed to build service.");
	// The window over [a, b] mentions both money and cash, so a query about
	// both scores the window above either record alone.
	let records = vec![
		record("a", "wire the money tonight", "x", Direction::Incoming, "2024-03-01T10:00:00"),
		record("b", "the cash is ready", "x", Direction::Outgoing, "2024-03-01T10:05:00"),
		record("c", "see you at the beach", "y", Direction::Incoming, "2024-03-02T09:00:00"),
	];

	service.index_records(records, &pair, true).await.expect("Indexing failed.");

	let response = service
		.search_merged(MergedSearchRequest {
			query: "money cash".to_string(),
			record_collection: pair.records.clone(),
			chunk_collection: pair.chunks.clone(),
			filter: SearchFilter::default(),
			top_k: Some(5),
			exclude_noise: None,
			strategy: Some(SearchStrategy::Exact),
		})
		.await
		.expect("Merged search failed.");

	assert!(response.degraded.is_empty());

	let ids: Vec<&str> = response.items.iter().map(|item| item.id.as_str()).collect();

	// The chunk wins over record a, its anchor.
	assert!(ids[0].starts_with("chunk_"), "Expected a chunk first, got {ids:?}");
	assert!(!ids.contains(&"a"), "The anchor record must be collapsed: {ids:?}");
	// Record b is a later record of the chunk, not its anchor; it may still
	// surface on its own.
	assert!(ids.contains(&"b"), "Expected the non-anchor record to survive: {ids:?}");
	assert_eq!(
		response.items[0].collection.as_deref(),
		Some(pair.chunks.as_str()),
		"Merged results carry their source collection."
	);

	collections.cleanup().await.expect("Failed to clean up test collections.");
}

#[tokio::test]
#[ignore = "Requires external Qdrant. Set SONDE_QDRANT_URL to run."]
async fn a_higher_scoring_record_suppresses_its_chunk() {
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
	let providers = keyword_providers(4, vec!["money", "cash", "beach"]);
	let service = build_service(cfg, providers).expect("Failed to build service.");
	let records = vec![
		record("a", "wire the money tonight", "x", Direction::Incoming, "2024-03-01T10:00:00"),
		record("b", "the cash is ready", "x", Direction::Outgoing, "2024-03-01T10:05:00"),
	];

	service.index_records(records, &pair, true).await.expect("Indexing failed.");

	// A query about money alone puts record a at 1.0 and the two-topic
	// window below it.
	let response = service
		.search_merged(MergedSearchRequest {
			query: "money".to_string(),
			record_collection: pair.records.clone(),
			chunk_collection: pair.chunks.clone(),
			filter: SearchFilter::default(),
			top_k: Some(5),
			exclude_noise: None,
			strategy: Some(SearchStrategy::Exact),
		})
		.await
		.expect("Merged search failed.");
	let ids: Vec<&str> = response.items.iter().map(|item| item.id.as_str()).collect();

	assert_eq!(ids[0], "a");
	assert!(
		!ids.iter().any(|id| id.starts_with("chunk_")),
		"The lower-scoring chunk must be collapsed into its anchor: {ids:?}"
	);

	collections.cleanup().await.expect("Failed to clean up test collections.");
}

#[tokio::test]
#[ignore = "Requires external Qdrant. Set SONDE_QDRANT_URL to run."]
async fn a_missing_chunk_collection_degrades_instead_of_failing() {
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
	let providers = keyword_providers(4, vec!["money", "cash", "beach"]);
	let service = build_service(cfg, providers).expect("Failed to build service.");
	let records = vec![
		record("a", "wire the money tonight", "x", Direction::Incoming, "2024-03-01T10:00:00"),
		record("c", "see you at the beach", "y", Direction::Incoming, "2024-03-02T09:00:00"),
	];

	service.index_records(records, &pair, true).await.expect("Indexing failed.");

	let response = service
		.search_merged(MergedSearchRequest {
			query: "money".to_string(),
			record_collection: pair.records.clone(),
			chunk_collection: "never_created".to_string(),
			filter: SearchFilter::default(),
			top_k: Some(5),
			exclude_noise: None,
			strategy: Some(SearchStrategy::Exact),
		})
		.await
		.expect("Merged search must not fail outright.");

	assert_eq!(response.degraded, vec!["never_created".to_string()]);
	assert_eq!(response.items[0].id, "a");

	collections.cleanup().await.expect("Failed to clean up test collections.");
}
