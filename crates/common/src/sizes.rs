//! Ad slot size normalization.

use serde_json::Value as Json;

/// One `[width, height]` entry as supplied by the host.
pub type AdSize = Vec<Json>;

/// Canonicalize a slot's raw size value into a list of size entries.
///
/// A single `[w, h]` pair is wrapped into a one-element list. Every element
/// that is not itself a list is dropped, preserving the order of the rest.
/// Values that are not lists at all produce an empty list.
pub fn normalize_sizes(raw: &Json) -> Vec<AdSize> {
    let Some(entries) = raw.as_array() else {
        log::debug!("Dropping non-list size value: {raw}");
        return Vec::new();
    };

    if is_single_pair(entries) {
        return vec![entries.clone()];
    }

    entries
        .iter()
        .filter_map(|entry| match entry.as_array() {
            Some(pair) => Some(pair.clone()),
            None => {
                log::debug!("Dropping malformed size entry: {entry}");
                None
            }
        })
        .collect()
}

fn is_single_pair(entries: &[Json]) -> bool {
    !entries.is_empty() && entries.iter().all(|entry| !entry.is_array())
}
