use serde::{Deserialize, Serialize};
use tracing::info;

use sonde_chunking::ChunkingConfig;
use sonde_config::Config;
use sonde_domain::Record;
use sonde_storage::models;

use crate::{Error, Result, SondeService, error::store_error};

/// A record collection and the chunk collection derived from it. They always
/// travel together: chunks are rebuilt wholesale whenever their records are.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct CollectionPair {
	pub records: String,
	pub chunks: String,
}
impl CollectionPair {
	pub fn from_config(cfg: &Config) -> Self {
		Self {
			records: cfg.storage.qdrant.collection_records.clone(),
			chunks: cfg.storage.qdrant.collection_chunks.clone(),
		}
	}

	/// Per-case collection names, e.g. `records_case1` / `record_chunks_case1`.
	pub fn for_case(cfg: &Config, case: &str) -> Self {
		Self {
			records: format!("{}_{case}", cfg.storage.qdrant.collection_records),
			chunks: format!("{}_{case}", cfg.storage.qdrant.collection_chunks),
		}
	}
}

#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
pub struct IndexReport {
	pub records_indexed: u64,
	pub chunks_indexed: u64,
}

impl SondeService {
	/// The indexing write path: noise labeling, chunk construction, batched
	/// embedding, storage. Assumed to run exclusive of reads against the same
	/// collection names; that mutual exclusion is the deployment's job.
	pub async fn index_records(
		&self,
		records: Vec<Record>,
		collections: &CollectionPair,
		rebuild: bool,
	) -> Result<IndexReport> {
		let mut records = records;

		self.providers.noise.classify(&mut records);

		let chunking = ChunkingConfig {
			window_size: self.cfg.chunking.window_size,
			overlap: self.cfg.chunking.overlap,
		};
		let chunks = sonde_chunking::build_chunks(&records, &chunking)?;

		info!(
			records = records.len(),
			chunks = chunks.len(),
			window_size = chunking.window_size,
			overlap = chunking.overlap,
			"Built context windows."
		);

		let record_texts: Vec<String> =
			records.iter().map(|record| record.text.clone()).collect();
		let chunk_texts: Vec<String> = chunks.iter().map(|chunk| chunk.text.clone()).collect();
		let record_vectors = self.embed_documents(&record_texts).await?;
		let chunk_vectors = self.embed_documents(&chunk_texts).await?;

		if rebuild {
			self.store
				.delete_collection(&collections.records)
				.await
				.map_err(|err| store_error("delete_collection", &collections.records, err))?;
			self.store
				.delete_collection(&collections.chunks)
				.await
				.map_err(|err| store_error("delete_collection", &collections.chunks, err))?;
		}

		self.store
			.ensure_collection(&collections.records)
			.await
			.map_err(|err| store_error("ensure_collection", &collections.records, err))?;
		self.store
			.ensure_collection(&collections.chunks)
			.await
			.map_err(|err| store_error("ensure_collection", &collections.chunks, err))?;

		let record_points = records
			.iter()
			.zip(record_vectors)
			.map(|(record, vector)| models::record_point(record, vector))
			.collect();
		let chunk_points = chunks
			.iter()
			.zip(chunk_vectors)
			.map(|(chunk, vector)| models::chunk_point(chunk, vector))
			.collect();

		self.store
			.upsert(&collections.records, record_points)
			.await
			.map_err(|err| store_error("upsert", &collections.records, err))?;
		self.store
			.upsert(&collections.chunks, chunk_points)
			.await
			.map_err(|err| store_error("upsert", &collections.chunks, err))?;

		info!(
			collection_records = %collections.records,
			collection_chunks = %collections.chunks,
			"Indexing finished."
		);

		Ok(IndexReport {
			records_indexed: records.len() as u64,
			chunks_indexed: chunks.len() as u64,
		})
	}

	async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
		let batch = self.cfg.providers.embedding.batch_size.max(1) as usize;
		let mut vectors = Vec::with_capacity(texts.len());

		for slice in texts.chunks(batch) {
			let embedded = self
				.providers
				.embedding
				.embed(&self.cfg.providers.embedding, slice)
				.await
				.map_err(|err| Error::Provider {
					message: format!("Document embedding failed: {err}"),
				})?;

			if embedded.len() != slice.len() {
				return Err(Error::Provider {
					message: "Embedding provider returned mismatched vector count.".to_string(),
				});
			}

			for vector in &embedded {
				self.check_dimension(vector)?;
			}

			vectors.extend(embedded);
		}

		Ok(vectors)
	}
}
