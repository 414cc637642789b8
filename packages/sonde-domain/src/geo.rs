use serde::{Deserialize, Serialize};

const EARTH_RADIUS_KM: f64 = 6_371.0;

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
pub struct GeoPoint {
	pub lat: f64,
	pub lon: f64,
}

/// Great-circle distance between two points, in kilometers.
///
/// The store-side geo predicate is a bounding box whose corners fall outside
/// the requested circle; callers that need exact circle membership post-filter
/// their results with this.
pub fn haversine_km(a: GeoPoint, b: GeoPoint) -> f64 {
	let d_lat = (b.lat - a.lat).to_radians();
	let d_lon = (b.lon - a.lon).to_radians();
	let h = (d_lat / 2.0).sin().powi(2)
		+ a.lat.to_radians().cos() * b.lat.to_radians().cos() * (d_lon / 2.0).sin().powi(2);

	2.0 * EARTH_RADIUS_KM * h.sqrt().asin()
}
