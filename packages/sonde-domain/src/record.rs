use serde::{Deserialize, Serialize};

use crate::geo::GeoPoint;

/// Direction of a communication relative to the examined device's owner.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
	Incoming,
	Outgoing,
}
impl Direction {
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Incoming => "incoming",
			Self::Outgoing => "outgoing",
		}
	}

	pub fn parse(raw: &str) -> Option<Self> {
		match raw.to_ascii_lowercase().as_str() {
			"incoming" => Some(Self::Incoming),
			"outgoing" => Some(Self::Outgoing),
			_ => None,
		}
	}
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
	Message,
	Image,
}
impl RecordKind {
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Message => "message",
			Self::Image => "image",
		}
	}
}

/// One atomic indexed unit, already normalized by an upstream parser: a
/// message, or the textual description of an image.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Record {
	/// Unique within its collection.
	pub id: String,
	pub text: String,
	/// ISO-8601, zero-padded; empty when the source row carried no timestamp.
	#[serde(default)]
	pub timestamp: String,
	#[serde(default)]
	pub direction: Option<Direction>,
	#[serde(default)]
	pub from: String,
	#[serde(default)]
	pub to: String,
	#[serde(default)]
	pub contact_name: String,
	#[serde(default)]
	pub gps: Option<GeoPoint>,
	#[serde(default)]
	pub is_noise: bool,
	pub kind: RecordKind,
	/// Source application, e.g. the messaging app the export came from.
	#[serde(default)]
	pub app: String,
}
impl Record {
	/// The conversation key: the person on the other end of the exchange.
	/// Incoming traffic points at the sender, everything else at the
	/// recipient.
	pub fn interlocutor(&self) -> &str {
		match self.direction {
			Some(Direction::Incoming) => &self.from,
			_ => &self.to,
		}
	}
}

/// A contiguous context window of two or more records from one conversation,
/// indexed separately from the records themselves and rebuilt wholesale on
/// reindex.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Chunk {
	pub id: String,
	pub record_ids: Vec<String>,
	/// The contained records formatted one per line.
	pub text: String,
	pub interlocutor: String,
	pub contact_name: String,
	/// Inherited from the first contained record, like `gps` and `app`.
	pub direction: Option<Direction>,
	pub start_timestamp: String,
	pub end_timestamp: String,
	pub first_record_id: String,
	pub last_record_id: String,
	pub record_count: u32,
	/// Offset of the window within its conversation.
	pub start_index: u32,
	pub gps: Option<GeoPoint>,
	pub app: String,
}
