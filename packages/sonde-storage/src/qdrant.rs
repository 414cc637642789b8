use qdrant_client::{
	Qdrant,
	qdrant::{
		CountPointsBuilder, CreateCollectionBuilder, Distance, Filter, PointStruct,
		Query, QueryPointsBuilder, RetrievedPoint, ScoredPoint, ScrollPointsBuilder,
		UpsertPointsBuilder, VectorParamsBuilder,
	},
};

use crate::Result;

const SCROLL_PAGE: u32 = 256;

/// Read/write handle on the vector store. Collections hold one unnamed dense
/// vector per point under cosine distance, plus the metadata payload and the
/// document text.
pub struct VectorStore {
	pub client: Qdrant,
	pub vector_dim: u32,
}
impl VectorStore {
	pub fn new(cfg: &sonde_config::Qdrant) -> Result<Self> {
		let client = Qdrant::from_url(&cfg.url).build()?;

		Ok(Self { client, vector_dim: cfg.vector_dim })
	}

	pub async fn collection_exists(&self, collection: &str) -> Result<bool> {
		Ok(self.client.collection_exists(collection).await?)
	}

	pub async fn ensure_collection(&self, collection: &str) -> Result<()> {
		if self.client.collection_exists(collection).await? {
			return Ok(());
		}

		self.client
			.create_collection(CreateCollectionBuilder::new(collection).vectors_config(
				VectorParamsBuilder::new(self.vector_dim as u64, Distance::Cosine),
			))
			.await?;

		Ok(())
	}

	pub async fn delete_collection(&self, collection: &str) -> Result<()> {
		if !self.client.collection_exists(collection).await? {
			return Ok(());
		}

		self.client.delete_collection(collection).await?;

		Ok(())
	}

	pub async fn count(&self, collection: &str) -> Result<u64> {
		let response = self.client.count(CountPointsBuilder::new(collection).exact(true)).await?;

		Ok(response.result.map(|result| result.count).unwrap_or(0))
	}

	pub async fn upsert(&self, collection: &str, points: Vec<PointStruct>) -> Result<()> {
		if points.is_empty() {
			return Ok(());
		}

		self.client
			.upsert_points(UpsertPointsBuilder::new(collection, points).wait(true))
			.await?;

		Ok(())
	}

	/// Every point matching the filter, with payload and vector. Pages through
	/// the whole collection; this is the exact strategy's candidate source.
	pub async fn scroll_all(
		&self,
		collection: &str,
		filter: Option<Filter>,
	) -> Result<Vec<RetrievedPoint>> {
		let mut points = Vec::new();
		let mut offset = None;

		loop {
			let mut scroll = ScrollPointsBuilder::new(collection)
				.limit(SCROLL_PAGE)
				.with_payload(true)
				.with_vectors(true);

			if let Some(filter) = filter.clone() {
				scroll = scroll.filter(filter);
			}
			if let Some(offset) = offset.take() {
				scroll = scroll.offset(offset);
			}

			let response = self.client.scroll(scroll).await?;

			points.extend(response.result);

			match response.next_page_offset {
				Some(next) => offset = Some(next),
				None => break,
			}
		}

		Ok(points)
	}

	/// The store's native approximate nearest-neighbor query. Fast; recall is
	/// whatever the index gives.
	pub async fn query_approx(
		&self,
		collection: &str,
		vector: Vec<f32>,
		filter: Option<Filter>,
		limit: u64,
	) -> Result<Vec<ScoredPoint>> {
		let mut query = QueryPointsBuilder::new(collection)
			.query(Query::new_nearest(vector))
			.limit(limit)
			.with_payload(true);

		if let Some(filter) = filter {
			query = query.filter(filter);
		}

		let response = self.client.query(query).await?;

		Ok(response.result)
	}
}
