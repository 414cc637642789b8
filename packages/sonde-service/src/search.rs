pub mod filter;

mod merge;

pub use filter::{CompiledFilter, GeoCircle, PredicateTerm, SearchFilter, TimeRange};

use qdrant_client::qdrant::ScoredPoint;
use serde::{Deserialize, Serialize};
use tracing::warn;

use sonde_storage::models;

use crate::{Error, Result, SondeService, error::store_error};

/// Over-fetch multiplier for each side of a record/chunk merge, leaving room
/// for anchor collapsing.
const MERGE_OVERFETCH: u32 = 2;

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchStrategy {
	/// Full-scan cosine ranking over every candidate matching the predicate.
	/// True top-k, at the price of reading the whole collection; fine for the
	/// corpus sizes this serves (hundreds to low thousands of records), a
	/// scaling ceiling beyond that.
	Exact,
	/// The store's native index. Fast, recall not guaranteed.
	Approximate,
}
impl SearchStrategy {
	pub(crate) fn from_config(raw: &str) -> Result<Self> {
		match raw {
			"exact" => Ok(Self::Exact),
			"approximate" => Ok(Self::Approximate),
			_ => Err(Error::Configuration {
				message: format!("search.strategy must be exact or approximate, got {raw:?}."),
			}),
		}
	}
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct SearchRequest {
	pub query: String,
	pub collection: String,
	#[serde(default)]
	pub filter: SearchFilter,
	#[serde(default)]
	pub top_k: Option<u32>,
	#[serde(default)]
	pub exclude_noise: Option<bool>,
	#[serde(default)]
	pub strategy: Option<SearchStrategy>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct MergedSearchRequest {
	pub query: String,
	pub record_collection: String,
	pub chunk_collection: String,
	#[serde(default)]
	pub filter: SearchFilter,
	#[serde(default)]
	pub top_k: Option<u32>,
	#[serde(default)]
	pub exclude_noise: Option<bool>,
	#[serde(default)]
	pub strategy: Option<SearchStrategy>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct SearchItem {
	/// The source record or chunk id, not the store's point id.
	pub id: String,
	/// Cosine similarity, higher is better.
	pub score: f32,
	/// Complement of the score: `1 - score`.
	pub distance: f32,
	pub metadata: serde_json::Value,
	pub document: String,
	/// Source collection, set when results from several collections are
	/// merged.
	#[serde(default)]
	pub collection: Option<String>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct SearchResponse {
	pub items: Vec<SearchItem>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct MergedSearchResponse {
	pub items: Vec<SearchItem>,
	/// Collections whose search failed and contributed nothing. Empty on a
	/// fully healthy merge.
	pub degraded: Vec<String>,
}

impl SondeService {
	/// Semantic search over one collection.
	pub async fn search(&self, req: SearchRequest) -> Result<SearchResponse> {
		let (k, exclude_noise, strategy) = self.resolve_request(
			&req.query,
			req.top_k,
			req.exclude_noise,
			req.strategy,
		)?;
		let compiled = filter::compile(&req.filter, exclude_noise);
		let vector = self.embed_query(req.query.trim()).await?;
		let items = self.retrieve(&req.collection, &vector, &compiled, k, strategy).await?;

		Ok(SearchResponse { items })
	}

	/// Semantic search over a record collection and its derived chunk
	/// collection, collapsed into one ranked list. No record appears twice,
	/// whether directly or as the first record of a surfaced chunk.
	pub async fn search_merged(&self, req: MergedSearchRequest) -> Result<MergedSearchResponse> {
		let (k, exclude_noise, strategy) = self.resolve_request(
			&req.query,
			req.top_k,
			req.exclude_noise,
			req.strategy,
		)?;
		let compiled = filter::compile(&req.filter, exclude_noise);
		let vector = self.embed_query(req.query.trim()).await?;
		let budget = k.saturating_mul(MERGE_OVERFETCH);
		let mut degraded = Vec::new();
		let record_hits = self
			.retrieve_or_degrade(
				&req.record_collection,
				&vector,
				&compiled,
				budget,
				strategy,
				&mut degraded,
			)
			.await;
		let chunk_hits = self
			.retrieve_or_degrade(
				&req.chunk_collection,
				&vector,
				&compiled,
				budget,
				strategy,
				&mut degraded,
			)
			.await;
		let record_pairs = record_hits.into_iter().map(|item| (item.id.clone(), item)).collect();
		let chunk_pairs = chunk_hits.into_iter().map(|item| (chunk_anchor(&item), item)).collect();
		let items = merge::merge_ranked(record_pairs, chunk_pairs, k as usize);

		Ok(MergedSearchResponse { items, degraded })
	}

	/// One side of a merge. A failing collection contributes nothing instead
	/// of aborting the whole merge; the failure is logged and reported back
	/// through `degraded`.
	async fn retrieve_or_degrade(
		&self,
		collection: &str,
		vector: &[f32],
		compiled: &CompiledFilter,
		budget: u32,
		strategy: SearchStrategy,
		degraded: &mut Vec<String>,
	) -> Vec<SearchItem> {
		match self.retrieve(collection, vector, compiled, budget, strategy).await {
			Ok(items) => tag_collection(items, collection),
			Err(err) => {
				warn!(
					collection,
					error = %err,
					"Collection search failed; continuing without its results."
				);

				degraded.push(collection.to_string());

				Vec::new()
			},
		}
	}

	fn resolve_request(
		&self,
		query: &str,
		top_k: Option<u32>,
		exclude_noise: Option<bool>,
		strategy: Option<SearchStrategy>,
	) -> Result<(u32, bool, SearchStrategy)> {
		if query.trim().is_empty() {
			return Err(Error::InvalidRequest { message: "query must be non-empty.".to_string() });
		}

		let k = top_k.unwrap_or(self.cfg.search.top_k).max(1);
		let exclude_noise = exclude_noise.unwrap_or(self.cfg.search.exclude_noise);
		let strategy = match strategy {
			Some(strategy) => strategy,
			None => SearchStrategy::from_config(&self.cfg.search.strategy)?,
		};

		Ok((k, exclude_noise, strategy))
	}

	pub(crate) async fn retrieve(
		&self,
		collection: &str,
		vector: &[f32],
		compiled: &CompiledFilter,
		k: u32,
		strategy: SearchStrategy,
	) -> Result<Vec<SearchItem>> {
		self.check_dimension(vector)?;

		let exists = self
			.store
			.collection_exists(collection)
			.await
			.map_err(|err| store_error("collection_exists", collection, err))?;

		if !exists {
			return Err(Error::NotFound { message: format!("Unknown collection {collection:?}.") });
		}

		// Residual time filtering discards hits after retrieval, so ask for
		// more than one page's worth up front.
		let fetch_k = if compiled.residual.is_some() {
			k.saturating_mul(self.cfg.search.residual_overfetch)
		} else {
			k
		};
		let items = match strategy {
			SearchStrategy::Approximate =>
				self.retrieve_approx(collection, vector, compiled, fetch_k).await?,
			SearchStrategy::Exact =>
				self.retrieve_exact(collection, vector, compiled, fetch_k).await?,
		};

		Ok(apply_residual(items, compiled.residual.as_ref(), k as usize))
	}

	async fn retrieve_approx(
		&self,
		collection: &str,
		vector: &[f32],
		compiled: &CompiledFilter,
		fetch_k: u32,
	) -> Result<Vec<SearchItem>> {
		let points = self
			.store
			.query_approx(collection, vector.to_vec(), compiled.store_filter(), fetch_k as u64)
			.await
			.map_err(|err| store_error("query", collection, err))?;
		let mut items = Vec::with_capacity(points.len());

		for point in &points {
			let Some(item) = scored_item(point) else {
				warn!(collection, "Search hit is missing its payload id.");

				continue;
			};

			items.push(item);
		}

		Ok(items)
	}

	async fn retrieve_exact(
		&self,
		collection: &str,
		vector: &[f32],
		compiled: &CompiledFilter,
		fetch_k: u32,
	) -> Result<Vec<SearchItem>> {
		let points = self
			.store
			.scroll_all(collection, compiled.store_filter())
			.await
			.map_err(|err| store_error("scroll", collection, err))?;
		let mut ranked = Vec::with_capacity(points.len());

		for point in &points {
			let Some(stored) = models::dense_vector(point) else {
				warn!(collection, "Stored point is missing its dense vector.");

				continue;
			};
			let Some(decoded) = models::decode_payload(&point.payload) else {
				warn!(collection, "Stored point is missing its payload id.");

				continue;
			};
			let score = cosine_similarity(vector, stored);

			ranked.push(SearchItem {
				id: decoded.id,
				score,
				distance: 1.0 - score,
				metadata: decoded.metadata,
				document: decoded.document,
				collection: None,
			});
		}

		rank_exact(&mut ranked);
		ranked.truncate(fetch_k as usize);

		Ok(ranked)
	}
}

/// Ascending cosine distance is descending similarity; ids break ties so the
/// ranking is reproducible.
fn rank_exact(items: &mut [SearchItem]) {
	items.sort_by(|a, b| a.distance.total_cmp(&b.distance).then_with(|| a.id.cmp(&b.id)));
}

fn apply_residual(
	items: Vec<SearchItem>,
	residual: Option<&TimeRange>,
	k: usize,
) -> Vec<SearchItem> {
	let mut items = items;

	if let Some(range) = residual {
		items.retain(|item| range.contains(item_timestamp(item)));
	}

	items.truncate(k);

	items
}

fn item_timestamp(item: &SearchItem) -> &str {
	item.metadata.get("timestamp").and_then(serde_json::Value::as_str).unwrap_or("")
}

fn chunk_anchor(item: &SearchItem) -> String {
	item.metadata
		.get("first_record_id")
		.and_then(serde_json::Value::as_str)
		.unwrap_or(item.id.as_str())
		.to_string()
}

fn tag_collection(items: Vec<SearchItem>, collection: &str) -> Vec<SearchItem> {
	items
		.into_iter()
		.map(|mut item| {
			item.collection = Some(collection.to_string());

			item
		})
		.collect()
}

fn scored_item(point: &ScoredPoint) -> Option<SearchItem> {
	let decoded = models::decode_payload(&point.payload)?;

	Some(SearchItem {
		id: decoded.id,
		score: point.score,
		distance: 1.0 - point.score,
		metadata: decoded.metadata,
		document: decoded.document,
		collection: None,
	})
}

pub(crate) fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
	let mut dot = 0.0_f32;
	let mut norm_a = 0.0_f32;
	let mut norm_b = 0.0_f32;

	for (x, y) in a.iter().zip(b) {
		dot += x * y;
		norm_a += x * x;
		norm_b += y * y;
	}

	if norm_a == 0.0 || norm_b == 0.0 {
		return 0.0;
	}

	dot / (norm_a.sqrt() * norm_b.sqrt())
}
