mod error;
mod types;

pub use error::{Error, Result};
pub use types::{Chunking, Config, EmbeddingProviderConfig, Providers, Qdrant, Search, Storage};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.storage.qdrant.url.trim().is_empty() {
		return Err(Error::Validation {
			message: "storage.qdrant.url must be non-empty.".to_string(),
		});
	}
	if cfg.storage.qdrant.collection_records.trim().is_empty()
		|| cfg.storage.qdrant.collection_chunks.trim().is_empty()
	{
		return Err(Error::Validation {
			message: "storage.qdrant collection names must be non-empty.".to_string(),
		});
	}
	if cfg.storage.qdrant.collection_records == cfg.storage.qdrant.collection_chunks {
		return Err(Error::Validation {
			message: "storage.qdrant.collection_records and storage.qdrant.collection_chunks must be distinct."
				.to_string(),
		});
	}
	if cfg.providers.embedding.dimensions == 0 {
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must be greater than zero.".to_string(),
		});
	}
	if cfg.providers.embedding.dimensions != cfg.storage.qdrant.vector_dim {
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must match storage.qdrant.vector_dim."
				.to_string(),
		});
	}
	if cfg.providers.embedding.api_key.trim().is_empty() {
		return Err(Error::Validation {
			message: "providers.embedding.api_key must be non-empty.".to_string(),
		});
	}
	if cfg.providers.embedding.batch_size == 0 {
		return Err(Error::Validation {
			message: "providers.embedding.batch_size must be greater than zero.".to_string(),
		});
	}
	if !matches!(cfg.search.strategy.as_str(), "exact" | "approximate") {
		return Err(Error::Validation {
			message: "search.strategy must be one of exact or approximate.".to_string(),
		});
	}
	if cfg.search.top_k == 0 {
		return Err(Error::Validation {
			message: "search.top_k must be greater than zero.".to_string(),
		});
	}
	if cfg.search.residual_overfetch == 0 {
		return Err(Error::Validation {
			message: "search.residual_overfetch must be greater than zero.".to_string(),
		});
	}
	if cfg.chunking.window_size == 0 {
		return Err(Error::Validation {
			message: "chunking.window_size must be greater than zero.".to_string(),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	cfg.providers.embedding.api_base =
		cfg.providers.embedding.api_base.trim().trim_end_matches('/').to_string();
	cfg.storage.qdrant.url = cfg.storage.qdrant.url.trim().to_string();
}
