use std::collections::HashMap;

use sonde_domain::{Chunk, Direction, Record};

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("chunking.window_size must be greater than zero.")]
	ZeroWindow,
}

#[derive(Clone, Debug)]
pub struct ChunkingConfig {
	pub window_size: u32,
	pub overlap: u32,
}

/// Builds overlapping context windows, one conversation at a time.
///
/// Records are grouped by interlocutor and sorted ascending by timestamp
/// (empty timestamps sort first), then a window of `window_size` records
/// slides over each conversation with stride `window_size - overlap`, never
/// less than one. Windows shorter than two records are dropped: they would
/// duplicate a record that is already indexed on its own.
pub fn build_chunks(records: &[Record], cfg: &ChunkingConfig) -> Result<Vec<Chunk>> {
	if cfg.window_size == 0 {
		return Err(Error::ZeroWindow);
	}

	let mut chunks = Vec::new();

	for (interlocutor, conversation) in group_by_interlocutor(records) {
		let emitted = chunk_conversation(&conversation, cfg, &interlocutor, chunks.len());

		chunks.extend(emitted);
	}

	Ok(chunks)
}

/// Groups in first-seen interlocutor order so chunk ids stay stable across
/// runs over the same input.
fn group_by_interlocutor(records: &[Record]) -> Vec<(String, Vec<Record>)> {
	let mut slots: HashMap<String, usize> = HashMap::new();
	let mut groups: Vec<(String, Vec<Record>)> = Vec::new();

	for record in records {
		let key = record.interlocutor().to_string();
		let slot = *slots.entry(key.clone()).or_insert_with(|| {
			groups.push((key, Vec::new()));

			groups.len() - 1
		});

		groups[slot].1.push(record.clone());
	}
	for (_, conversation) in &mut groups {
		conversation.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
	}

	groups
}

fn chunk_conversation(
	conversation: &[Record],
	cfg: &ChunkingConfig,
	interlocutor: &str,
	id_offset: usize,
) -> Vec<Chunk> {
	let window = cfg.window_size as usize;
	let stride = window.saturating_sub(cfg.overlap as usize).max(1);
	let contact_name =
		conversation.first().map(|record| record.contact_name.clone()).unwrap_or_default();
	let mut chunks = Vec::new();
	let mut start = 0_usize;

	while start < conversation.len() {
		let end = (start + window).min(conversation.len());
		let slice = &conversation[start..end];

		if slice.len() >= 2 {
			chunks.push(build_chunk(
				slice,
				interlocutor,
				&contact_name,
				id_offset + chunks.len(),
				start,
			));
		}
		// The final partial window is emitted at most once, then the
		// conversation is done.
		if slice.len() < window {
			break;
		}

		start += stride;
	}

	chunks
}

fn build_chunk(
	records: &[Record],
	interlocutor: &str,
	contact_name: &str,
	counter: usize,
	start_index: usize,
) -> Chunk {
	let record_ids: Vec<String> = records.iter().map(|record| record.id.clone()).collect();
	let lines: Vec<String> = records.iter().map(format_record_line).collect();
	let first = &records[0];
	let last = &records[records.len() - 1];

	Chunk {
		id: format!("chunk_{counter}_{interlocutor}_{start_index}"),
		text: lines.join("\n"),
		interlocutor: interlocutor.to_string(),
		contact_name: contact_name.to_string(),
		direction: first.direction,
		start_timestamp: first.timestamp.clone(),
		end_timestamp: last.timestamp.clone(),
		first_record_id: record_ids[0].clone(),
		last_record_id: record_ids[record_ids.len() - 1].clone(),
		record_count: records.len() as u32,
		start_index: start_index as u32,
		gps: first.gps,
		app: first.app.clone(),
		record_ids,
	}
}

/// `[2024-03-01 14:05] Alice: …`; outgoing records are labeled `Me`.
fn format_record_line(record: &Record) -> String {
	let label = match record.direction {
		Some(Direction::Outgoing) => "Me",
		_ if record.contact_name.is_empty() => record.interlocutor(),
		_ => record.contact_name.as_str(),
	};
	let stamp = short_timestamp(&record.timestamp);

	format!("[{stamp}] {label}: {}", record.text)
}

/// Date plus hours and minutes; millisecond noise distracts a reviewer.
fn short_timestamp(timestamp: &str) -> String {
	match timestamp.split_once('T') {
		Some((date, time)) => format!("{date} {}", &time[..time.len().min(5)]),
		None => timestamp.to_string(),
	}
}
