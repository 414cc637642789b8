mod geo;
mod record;

pub use geo::{GeoPoint, haversine_km};
pub use record::{Chunk, Direction, Record, RecordKind};
