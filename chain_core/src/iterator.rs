//!
//! Iterator handle registries, one set per apply context.
//!
//! Handles are small integers handed to guest code: `>= 0` addresses a
//! cached row, `-1` is invalid, and anything below encodes the end
//! sentinel of a cached table (`-2 - table_slot`). The sentinel is a real
//! position: stepping backwards from it yields the greatest row.
//!

use chain_ee::ChainError;
use state_store::{SecondaryValue, TableId};
use std::collections::BTreeMap;

pub(crate) struct HandleCache<P> {
    tables: Vec<TableId>,
    table_slots: BTreeMap<TableId, usize>,
    positions: Vec<Option<(TableId, P)>>,
    existing: BTreeMap<(TableId, P), i32>,
}

impl<P: Ord + Copy> Default for HandleCache<P> {
    fn default() -> Self {
        HandleCache {
            tables: Vec::new(),
            table_slots: BTreeMap::new(),
            positions: Vec::new(),
            existing: BTreeMap::new(),
        }
    }
}

impl<P: Ord + Copy> HandleCache<P> {
    pub fn cache_table(&mut self, table: TableId) -> usize {
        if let Some(&slot) = self.table_slots.get(&table) {
            return slot;
        }
        let slot = self.tables.len();
        self.tables.push(table);
        self.table_slots.insert(table, slot);
        slot
    }

    pub fn end_iterator(&mut self, table: TableId) -> i32 {
        let slot = self.cache_table(table);
        -(slot as i32) - 2
    }

    pub fn table_of_end(&self, iterator: i32) -> Result<TableId, ChainError> {
        if iterator >= -1 {
            return Err(ChainError::db_api("not an end iterator"));
        }
        let slot = (-iterator - 2) as usize;
        self.tables
            .get(slot)
            .copied()
            .ok_or_else(|| ChainError::db_api("invalid end iterator"))
    }

    pub fn add(&mut self, table: TableId, position: P) -> i32 {
        if let Some(&iterator) = self.existing.get(&(table, position)) {
            return iterator;
        }
        let iterator = self.positions.len() as i32;
        self.positions.push(Some((table, position)));
        self.existing.insert((table, position), iterator);
        iterator
    }

    pub fn get(&self, iterator: i32) -> Result<(TableId, P), ChainError> {
        if iterator < 0 {
            return Err(ChainError::db_api("dereference of end iterator"));
        }
        self.positions
            .get(iterator as usize)
            .copied()
            .flatten()
            .ok_or_else(|| ChainError::db_api("invalid iterator"))
    }

    /// Invalidates the handle after its row was removed.
    pub fn remove(&mut self, iterator: i32) {
        if iterator < 0 {
            return;
        }
        if let Some(slot) = self.positions.get_mut(iterator as usize) {
            if let Some(position) = slot.take() {
                self.existing.remove(&position);
            }
        }
    }

    /// Re-keys a live handle, keeping the handle number stable.
    pub fn update(&mut self, iterator: i32, position: P) {
        if iterator < 0 {
            return;
        }
        if let Some(slot) = self.positions.get_mut(iterator as usize) {
            if let Some((table, old)) = *slot {
                self.existing.remove(&(table, old));
                *slot = Some((table, position));
                self.existing.insert((table, position), iterator);
            }
        }
    }
}

pub(crate) type PrimaryCache = HandleCache<u64>;

/// Secondary caches key handles by `(sort key, primary)` so walking by
/// secondary order and invalidation both work.
pub(crate) type SecondaryCache = HandleCache<(state_store::SortKey, u64)>;

pub(crate) fn secondary_position(
    value: SecondaryValue,
    primary: u64,
) -> (state_store::SortKey, u64) {
    (value.sort_key(), primary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handles_are_stable_and_deduplicated() {
        let mut cache = PrimaryCache::default();
        let a = cache.add(7, 100);
        let b = cache.add(7, 200);
        assert_ne!(a, b);
        assert_eq!(cache.add(7, 100), a);
        assert_eq!(cache.get(a).unwrap(), (7, 100));
    }

    #[test]
    fn end_iterators_encode_tables() {
        let mut cache = PrimaryCache::default();
        let end_a = cache.end_iterator(1);
        let end_b = cache.end_iterator(2);
        assert_eq!(end_a, -2);
        assert_eq!(end_b, -3);
        assert_eq!(cache.end_iterator(1), -2);
        assert_eq!(cache.table_of_end(end_b).unwrap(), 2);
        assert!(cache.table_of_end(0).is_err());
    }

    #[test]
    fn removed_handles_invalidate() {
        let mut cache = PrimaryCache::default();
        let a = cache.add(7, 100);
        cache.remove(a);
        assert!(cache.get(a).is_err());
        // the slot is not recycled
        let b = cache.add(7, 100);
        assert_ne!(a, b);
    }
}
