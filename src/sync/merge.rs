use std::collections::HashMap;

use crate::sync::normalize::DisplayMessage;

/// Combines two batches into one collection ordered by creation time.
///
/// Entries are keyed by id: everything in `existing` goes in first, then
/// `incoming`, so an incoming entry replaces an existing one with the same
/// id (merge order wins, timestamps are not compared). A replaced entry
/// keeps the slot of its first appearance, and the final sort is stable,
/// so equal timestamps come out in the same order on every run.
pub fn merge(existing: &[DisplayMessage], incoming: &[DisplayMessage]) -> Vec<DisplayMessage> {
    let mut slots: HashMap<&str, usize> = HashMap::with_capacity(existing.len() + incoming.len());
    let mut out: Vec<DisplayMessage> = Vec::with_capacity(existing.len() + incoming.len());

    for message in existing.iter().chain(incoming) {
        match slots.get(message.id()) {
            Some(&idx) => out[idx] = message.clone(),
            None => {
                slots.insert(message.id(), out.len());
                out.push(message.clone());
            }
        }
    }

    out.sort_by_key(DisplayMessage::created_at_ms);
    out
}
