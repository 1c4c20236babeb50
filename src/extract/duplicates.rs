use std::collections::HashMap;

use tracing::debug;

use crate::model::DocumentRecord;

/// A repeated number: the ordinal given to the current record and, on the second
/// sighting, the index of the first occurrence that was rewritten to `-1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Repeat {
    pub ordinal: u32,
    pub rewritten_first: Option<usize>,
}

/// Assigns `-N` ordinals to repeated numbers within one batch. The caller decides what a
/// batch is by choosing which slice of records goes through one resolver.
#[derive(Debug, Default)]
pub struct DuplicateResolver {
    occurrences: HashMap<String, u32>,
    first_index: HashMap<String, usize>,
}

impl DuplicateResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `records[index]`. On the second sighting of a number the first
    /// occurrence is rewritten to `-1` and the current one gets `-2`; later sightings
    /// continue with `-3`, `-4`, ... Returns `None` for a first sighting.
    pub fn assign(&mut self, records: &mut [DocumentRecord], index: usize) -> Option<Repeat> {
        let number = records.get(index)?.number.clone()?;

        let count = self.occurrences.entry(number.clone()).or_insert(0);
        *count += 1;
        let count = *count;

        if count == 1 {
            self.first_index.insert(number, index);
            return None;
        }

        let mut rewritten_first = None;
        if count == 2 {
            if let Some(&first) = self.first_index.get(&number) {
                if let Some(record) = records.get_mut(first) {
                    record.disambiguation_suffix = Some(1);
                    rewritten_first = Some(first);
                }
            }
        }

        if let Some(record) = records.get_mut(index) {
            record.disambiguation_suffix = Some(count);
        }
        debug!(number = %number, ordinal = count, "duplicate number");
        Some(Repeat {
            ordinal: count,
            rewritten_first,
        })
    }

    /// Runs [`Self::assign`] over every record in scan order; returns the number of repeats.
    pub fn resolve_all(&mut self, records: &mut [DocumentRecord]) -> usize {
        (0..records.len())
            .filter(|index| self.assign(records, *index).is_some())
            .count()
    }
}

/// Orders records by effective identifier; records without a number sort first.
pub fn sort_by_effective_number(records: &mut [DocumentRecord]) {
    records.sort_by_cached_key(DocumentRecord::sort_key);
}
