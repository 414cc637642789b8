use std::collections::HashMap;

use qdrant_client::{
	client::Payload,
	qdrant::{PointStruct, RetrievedPoint, Value, value::Kind, vectors_output::VectorsOptions},
};
use uuid::Uuid;

use sonde_domain::{Chunk, Record};

/// Qdrant point ids are numbers or UUIDs while source ids are free-form
/// strings, so points are keyed by a v5 digest of the source id and the
/// source id itself lives in the payload.
pub fn point_uuid(id: &str) -> Uuid {
	Uuid::new_v5(&Uuid::NAMESPACE_OID, id.as_bytes())
}

pub fn record_point(record: &Record, vector: Vec<f32>) -> PointStruct {
	let mut payload = Payload::new();

	payload.insert("id", record.id.clone());
	payload.insert("kind", record.kind.as_str());
	payload.insert("timestamp", record.timestamp.clone());
	payload.insert("direction", record.direction.map(|d| d.as_str()).unwrap_or(""));
	payload.insert("from", record.from.clone());
	payload.insert("to", record.to.clone());
	payload.insert("contact_name", record.contact_name.clone());
	payload.insert("app", record.app.clone());
	payload.insert("is_noise", record.is_noise);

	if let Some(gps) = record.gps {
		payload.insert("gps_lat", gps.lat);
		payload.insert("gps_lon", gps.lon);
	}

	payload.insert("document", record.text.clone());

	PointStruct::new(point_uuid(&record.id).to_string(), vector, payload)
}

pub fn chunk_point(chunk: &Chunk, vector: Vec<f32>) -> PointStruct {
	let mut payload = Payload::new();

	payload.insert("id", chunk.id.clone());
	payload.insert("kind", "chunk");
	// The plain timestamp mirrors the window start so chunks answer the same
	// time filters as records.
	payload.insert("timestamp", chunk.start_timestamp.clone());
	payload.insert("start_timestamp", chunk.start_timestamp.clone());
	payload.insert("end_timestamp", chunk.end_timestamp.clone());
	payload.insert("interlocutor", chunk.interlocutor.clone());
	payload.insert("contact_name", chunk.contact_name.clone());
	payload.insert("direction", chunk.direction.map(|d| d.as_str()).unwrap_or(""));
	payload.insert("first_record_id", chunk.first_record_id.clone());
	payload.insert("last_record_id", chunk.last_record_id.clone());
	payload.insert("record_ids", chunk.record_ids.join(","));
	payload.insert("record_count", chunk.record_count as i64);
	payload.insert("start_index", chunk.start_index as i64);
	payload.insert("app", chunk.app.clone());
	// Context windows are never noise.
	payload.insert("is_noise", false);

	if let Some(gps) = chunk.gps {
		payload.insert("gps_lat", gps.lat);
		payload.insert("gps_lon", gps.lon);
	}

	payload.insert("document", chunk.text.clone());

	PointStruct::new(point_uuid(&chunk.id).to_string(), vector, payload)
}

#[derive(Clone, Debug)]
pub struct DecodedPoint {
	pub id: String,
	pub document: String,
	pub metadata: serde_json::Value,
}

/// Splits a stored payload back into the source id, the document text, and
/// the remaining metadata. Returns `None` when the payload carries no id;
/// such a point was not written by this system.
pub fn decode_payload(payload: &HashMap<String, Value>) -> Option<DecodedPoint> {
	let id = payload_str(payload, "id")?;
	let document = payload_str(payload, "document").unwrap_or_default();
	let metadata = payload
		.iter()
		.filter(|(key, _)| key.as_str() != "id" && key.as_str() != "document")
		.map(|(key, value)| (key.clone(), value_to_json(value)))
		.collect();

	Some(DecodedPoint { id, document, metadata: serde_json::Value::Object(metadata) })
}

/// The point's unnamed dense vector, when the read asked for vectors.
pub fn dense_vector(point: &RetrievedPoint) -> Option<&[f32]> {
	match point.vectors.as_ref()?.vectors_options.as_ref()? {
		VectorsOptions::Vector(vector) => Some(&vector.data),
		_ => None,
	}
}

fn payload_str(payload: &HashMap<String, Value>, key: &str) -> Option<String> {
	match &payload.get(key)?.kind {
		Some(Kind::StringValue(text)) => Some(text.clone()),
		_ => None,
	}
}

fn value_to_json(value: &Value) -> serde_json::Value {
	match &value.kind {
		Some(Kind::BoolValue(value)) => serde_json::Value::Bool(*value),
		Some(Kind::IntegerValue(value)) => serde_json::Value::from(*value),
		Some(Kind::DoubleValue(value)) => serde_json::Value::from(*value),
		Some(Kind::StringValue(value)) => serde_json::Value::String(value.clone()),
		Some(Kind::ListValue(list)) =>
			serde_json::Value::Array(list.values.iter().map(value_to_json).collect()),
		Some(Kind::StructValue(object)) => serde_json::Value::Object(
			object.fields.iter().map(|(key, value)| (key.clone(), value_to_json(value))).collect(),
		),
		_ => serde_json::Value::Null,
	}
}
