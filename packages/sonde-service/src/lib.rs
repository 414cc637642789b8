pub mod index;
pub mod search;

mod error;

pub use error::{Error, Result};
pub use index::{CollectionPair, IndexReport};
pub use search::{
	CompiledFilter, GeoCircle, MergedSearchRequest, MergedSearchResponse, SearchFilter,
	SearchItem, SearchRequest, SearchResponse, SearchStrategy, TimeRange,
};

use std::{future::Future, pin::Pin, sync::Arc};

use sonde_config::{Config, EmbeddingProviderConfig};
use sonde_domain::Record;
use sonde_providers::embedding;
use sonde_storage::qdrant::VectorStore;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait EmbeddingProvider
where
	Self: Send + Sync,
{
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, sonde_providers::Result<Vec<Vec<f32>>>>;
}

/// Labels records as noise ahead of indexing. The default labels nothing;
/// the flag and its filter are the seam for a real classifier.
pub trait NoiseClassifier
where
	Self: Send + Sync,
{
	fn classify(&self, records: &mut [Record]);
}

pub struct PassthroughNoise;
impl NoiseClassifier for PassthroughNoise {
	fn classify(&self, records: &mut [Record]) {
		for record in records {
			record.is_noise = false;
		}
	}
}

struct DefaultProviders;
impl EmbeddingProvider for DefaultProviders {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, sonde_providers::Result<Vec<Vec<f32>>>> {
		Box::pin(embedding::embed(cfg, texts))
	}
}

#[derive(Clone)]
pub struct Providers {
	pub embedding: Arc<dyn EmbeddingProvider>,
	pub noise: Arc<dyn NoiseClassifier>,
}
impl Providers {
	pub fn new(embedding: Arc<dyn EmbeddingProvider>, noise: Arc<dyn NoiseClassifier>) -> Self {
		Self { embedding, noise }
	}
}
impl Default for Providers {
	fn default() -> Self {
		Self { embedding: Arc::new(DefaultProviders), noise: Arc::new(PassthroughNoise) }
	}
}

pub struct SondeService {
	pub cfg: Config,
	pub store: VectorStore,
	pub providers: Providers,
}
impl SondeService {
	pub fn new(cfg: Config, store: VectorStore) -> Self {
		Self { cfg, store, providers: Providers::default() }
	}

	pub fn with_providers(cfg: Config, store: VectorStore, providers: Providers) -> Self {
		Self { cfg, store, providers }
	}

	pub(crate) async fn embed_query(&self, query: &str) -> Result<Vec<f32>> {
		let embeddings = self
			.providers
			.embedding
			.embed(&self.cfg.providers.embedding, std::slice::from_ref(&query.to_string()))
			.await
			.map_err(|err| Error::Provider { message: format!("Query embedding failed: {err}") })?;
		let vector = embeddings.into_iter().next().ok_or_else(|| Error::Provider {
			message: "Embedding provider returned no vectors.".to_string(),
		})?;

		self.check_dimension(&vector)?;

		Ok(vector)
	}

	pub(crate) fn check_dimension(&self, vector: &[f32]) -> Result<()> {
		if vector.is_empty() || vector.len() != self.cfg.storage.qdrant.vector_dim as usize {
			return Err(Error::InvalidRequest {
				message: format!(
					"Embedding vector dimension mismatch: got {}, the store is configured for {}.",
					vector.len(),
					self.cfg.storage.qdrant.vector_dim
				),
			});
		}

		Ok(())
	}
}
