use std::collections::{HashMap, hash_map::Entry};

use crate::search::SearchItem;

/// Collapses a record hit and the chunk hit anchored on it into the
/// higher-scoring representation, then re-ranks the survivors.
///
/// A chunk's anchor is its first record only; the chunk's later records can
/// still surface as independent record hits. Full multi-id dedup is a
/// different policy, deliberately not this one.
pub(crate) fn merge_ranked(
	record_hits: Vec<(String, SearchItem)>,
	chunk_hits: Vec<(String, SearchItem)>,
	k: usize,
) -> Vec<SearchItem> {
	let mut records: HashMap<String, SearchItem> = HashMap::new();

	for (anchor, hit) in record_hits {
		insert_max(&mut records, anchor, hit);
	}

	let mut chunks: HashMap<String, SearchItem> = HashMap::new();

	for (anchor, hit) in chunk_hits {
		// The chunk and the record that opens it are the same evidence at two
		// granularities; the higher-scoring one represents both.
		if let Some(record) = records.get(&anchor) {
			if record.score >= hit.score {
				continue;
			}

			records.remove(&anchor);
		}

		insert_max(&mut chunks, anchor, hit);
	}

	let mut merged: Vec<SearchItem> =
		records.into_values().chain(chunks.into_values()).collect();

	// Descending score; ids break ties so the ordering is reproducible.
	merged.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.id.cmp(&b.id)));
	merged.truncate(k);

	merged
}

fn insert_max(map: &mut HashMap<String, SearchItem>, anchor: String, hit: SearchItem) {
	match map.entry(anchor) {
		Entry::Occupied(mut slot) =>
			if hit.score > slot.get().score {
				slot.insert(hit);
			},
		Entry::Vacant(slot) => {
			slot.insert(hit);
		},
	}
}
