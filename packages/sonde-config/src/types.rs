use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
pub struct Config {
	pub storage: Storage,
	pub providers: Providers,
	pub chunking: Chunking,
	pub search: Search,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
	pub qdrant: Qdrant,
}

#[derive(Debug, Deserialize)]
pub struct Qdrant {
	pub url: String,
	pub collection_records: String,
	pub collection_chunks: String,
	pub vector_dim: u32,
}

#[derive(Debug, Deserialize)]
pub struct Providers {
	pub embedding: EmbeddingProviderConfig,
}

#[derive(Debug, Deserialize)]
pub struct EmbeddingProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub dimensions: u32,
	pub timeout_ms: u64,
	#[serde(default = "default_batch_size")]
	pub batch_size: u32,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct Chunking {
	pub window_size: u32,
	pub overlap: u32,
}

#[derive(Debug, Deserialize)]
pub struct Search {
	/// `exact` or `approximate`.
	pub strategy: String,
	pub top_k: u32,
	#[serde(default)]
	pub exclude_noise: bool,
	/// Raw-result multiplier applied when a time range must be filtered
	/// in-process after retrieval.
	#[serde(default = "default_residual_overfetch")]
	pub residual_overfetch: u32,
}

fn default_batch_size() -> u32 {
	32
}

fn default_residual_overfetch() -> u32 {
	3
}
