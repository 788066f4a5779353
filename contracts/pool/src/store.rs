//! Ledger Store
//!
//! Durable home of the pool aggregate and the contributor entries. Engines
//! receive the store explicitly; nothing lives in hidden globals.

use std::collections::BTreeMap;

use sha2::{Digest, Sha256};

use dxpool_common::types::{Address, ContributorEntry, PoolState};

/// Persistence interface the engines read and write through
pub trait LedgerStore {
    /// Current pool aggregate
    fn state(&self) -> &PoolState;

    /// Replace the pool aggregate
    fn put_state(&mut self, state: PoolState);

    /// Entry for `who`, if one was ever created
    fn entry(&self, who: &Address) -> Option<ContributorEntry>;

    /// Create or replace the entry for `who`
    fn put_entry(&mut self, who: Address, entry: ContributorEntry);

    /// All entries in ascending address order
    fn entries(&self) -> Vec<(Address, ContributorEntry)>;
}

/// In-memory store backed by ordered maps
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryStore {
    state: PoolState,
    entries: BTreeMap<Address, ContributorEntry>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries held
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl LedgerStore for MemoryStore {
    fn state(&self) -> &PoolState {
        &self.state
    }

    fn put_state(&mut self, state: PoolState) {
        self.state = state;
    }

    fn entry(&self, who: &Address) -> Option<ContributorEntry> {
        self.entries.get(who).cloned()
    }

    fn put_entry(&mut self, who: Address, entry: ContributorEntry) {
        self.entries.insert(who, entry);
    }

    fn entries(&self) -> Vec<(Address, ContributorEntry)> {
        self.entries.iter().map(|(k, v)| (*k, v.clone())).collect()
    }
}

/// SHA-256 over the borsh encoding of the aggregate and every entry.
///
/// Equal digests mean byte-identical ledgers.
pub fn ledger_digest<S: LedgerStore>(store: &S) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(borsh::to_vec(store.state()).unwrap_or_default());
    for (who, entry) in store.entries() {
        hasher.update(who);
        hasher.update(borsh::to_vec(&entry).unwrap_or_default());
    }
    let result = hasher.finalize();
    let mut digest = [0u8; 32];
    digest.copy_from_slice(&result);
    digest
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entries_sorted() {
        let mut store = MemoryStore::new();
        store.put_entry([3u8; 32], ContributorEntry::new(1));
        store.put_entry([1u8; 32], ContributorEntry::new(2));

        let entries = store.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].0, [1u8; 32]);
        assert_eq!(entries[1].0, [3u8; 32]);
    }

    #[test]
    fn test_digest_tracks_changes() {
        let mut store = MemoryStore::new();
        let empty = ledger_digest(&store);

        let mut entry = ContributorEntry::new(5);
        entry.asset1_amount = 10;
        store.put_entry([1u8; 32], entry.clone());
        let with_entry = ledger_digest(&store);
        assert_ne!(empty, with_entry);

        // Same content, same digest
        let mut other = MemoryStore::new();
        other.put_entry([1u8; 32], entry);
        assert_eq!(with_entry, ledger_digest(&other));
    }

    #[test]
    fn test_digest_covers_state() {
        let mut store = MemoryStore::new();
        let before = ledger_digest(&store);

        let mut state = store.state().clone();
        state.asset2_total = 1;
        store.put_state(state);
        assert_ne!(before, ledger_digest(&store));
    }
}
