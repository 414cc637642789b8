pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Configuration error: {message}")]
	Configuration { message: String },
	#[error("Not found: {message}")]
	NotFound { message: String },
	#[error("Provider error: {message}")]
	Provider { message: String },
	#[error("Store error: {message}")]
	Store { message: String },
}
impl From<sonde_chunking::Error> for Error {
	fn from(err: sonde_chunking::Error) -> Self {
		Self::Configuration { message: err.to_string() }
	}
}
impl From<sonde_providers::Error> for Error {
	fn from(err: sonde_providers::Error) -> Self {
		Self::Provider { message: err.to_string() }
	}
}

/// Wraps a store failure with the operation and collection it happened on.
/// Missing collections keep their own kind so callers can tell "nothing
/// there" apart from "something is broken".
pub(crate) fn store_error(
	operation: &str,
	collection: &str,
	err: sonde_storage::Error,
) -> Error {
	match err {
		sonde_storage::Error::NotFound(message) => Error::NotFound { message },
		err => Error::Store { message: format!("{operation} on {collection:?} failed: {err}") },
	}
}
