//! Type-partitioned batching for multi-event writes.

use std::collections::HashMap;

use eventstores_core::event::Event;

/// Splits events into one batch per distinct `type`.
///
/// Batches appear in order of each type's first occurrence, and events keep
/// their relative input order within a batch.
#[must_use]
pub fn group_by_type(events: &[Event]) -> Vec<(String, Vec<Event>)> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<(String, Vec<Event>)> = Vec::new();
    for event in events {
        let slot = *index.entry(event.event_type.as_str()).or_insert_with(|| {
            groups.push((event.event_type.clone(), Vec::new()));
            groups.len() - 1
        });
        groups[slot].1.push(event.clone());
    }
    groups
}
