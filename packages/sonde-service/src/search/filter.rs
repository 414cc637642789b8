use qdrant_client::qdrant::{Condition, Filter, Range};
use serde::{Deserialize, Serialize};

use sonde_domain::Direction;

/// Kilometers per degree of latitude; longitude degrees shrink by cos(lat).
const KM_PER_DEGREE: f64 = 111.0;

/// The semantic constraints a caller can put on a query. A pure value
/// object, built per request and never persisted.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct SearchFilter {
	#[serde(default)]
	pub time_start: Option<String>,
	#[serde(default)]
	pub time_end: Option<String>,
	#[serde(default)]
	pub direction: Option<Direction>,
	#[serde(default)]
	pub geo: Option<GeoCircle>,
}

#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
pub struct GeoCircle {
	pub lat: f64,
	pub lon: f64,
	pub radius_km: f64,
}

/// Closed range over zero-padded ISO-8601 strings, so lexicographic
/// comparison is chronological comparison. Applied in-process after
/// retrieval: compound range-plus-equality conjunctions are the least
/// reliable corner of the store's predicate language, so time never gets
/// pushed down.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TimeRange {
	pub start: Option<String>,
	pub end: Option<String>,
}
impl TimeRange {
	pub fn contains(&self, timestamp: &str) -> bool {
		// A result without a timestamp cannot be placed inside the range.
		if timestamp.is_empty() {
			return false;
		}
		if self.start.as_deref().is_some_and(|start| timestamp < start) {
			return false;
		}
		if self.end.as_deref().is_some_and(|end| timestamp > end) {
			return false;
		}

		true
	}
}

/// One constraint pushed down to the store. Terms stay independent all the
/// way to the wire: the conversion below puts each one into the filter's
/// `must` list, the store's explicit conjunction. Terms are never folded
/// into one another, so two constraints on the same field cannot clobber
/// each other.
#[derive(Clone, Debug, PartialEq)]
pub enum PredicateTerm {
	DirectionEquals(Direction),
	NotNoise,
	LatitudeBetween { min: f64, max: f64 },
	LongitudeBetween { min: f64, max: f64 },
}

/// What the compiler hands the retrieval layer: the store-side conjunction
/// and the residual time range to apply after retrieval.
#[derive(Clone, Debug, Default)]
pub struct CompiledFilter {
	pub predicate: Vec<PredicateTerm>,
	pub residual: Option<TimeRange>,
}
impl CompiledFilter {
	pub fn store_filter(&self) -> Option<Filter> {
		if self.predicate.is_empty() {
			return None;
		}

		Some(Filter {
			must: self.predicate.iter().map(term_condition).collect(),
			..Default::default()
		})
	}
}

pub fn compile(filter: &SearchFilter, exclude_noise: bool) -> CompiledFilter {
	let mut predicate = Vec::new();

	if let Some(direction) = filter.direction {
		predicate.push(PredicateTerm::DirectionEquals(direction));
	}
	if exclude_noise {
		predicate.push(PredicateTerm::NotNoise);
	}
	if let Some(geo) = filter.geo {
		let delta_lat = geo.radius_km / KM_PER_DEGREE;
		// Meridians converge toward the poles; widening the longitude span
		// keeps the box a superset of the circle. Corner points of the box can
		// still sit outside the circle; exact membership is the caller's
		// haversine post-filter.
		let delta_lon = geo.radius_km / (KM_PER_DEGREE * geo.lat.to_radians().cos());

		predicate.push(PredicateTerm::LatitudeBetween {
			min: geo.lat - delta_lat,
			max: geo.lat + delta_lat,
		});
		predicate.push(PredicateTerm::LongitudeBetween {
			min: geo.lon - delta_lon,
			max: geo.lon + delta_lon,
		});
	}

	let residual = if filter.time_start.is_some() || filter.time_end.is_some() {
		Some(TimeRange { start: filter.time_start.clone(), end: filter.time_end.clone() })
	} else {
		None
	};

	CompiledFilter { predicate, residual }
}

fn term_condition(term: &PredicateTerm) -> Condition {
	match term {
		PredicateTerm::DirectionEquals(direction) =>
			Condition::matches("direction", direction.as_str().to_string()),
		PredicateTerm::NotNoise => Condition::matches("is_noise", false),
		PredicateTerm::LatitudeBetween { min, max } => Condition::range(
			"gps_lat",
			Range { gte: Some(*min), lte: Some(*max), ..Default::default() },
		),
		PredicateTerm::LongitudeBetween { min, max } => Condition::range(
			"gps_lon",
			Range { gte: Some(*min), lte: Some(*max), ..Default::default() },
		),
	}
}
