//! Per-fetcher snapshot of the last fetched collection

use super::collection::{NameIndex, ResourceCollection};

/// A collection together with the index built from it
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub collection: ResourceCollection,
    pub index: NameIndex,
}

/// Holds at most one [`Snapshot`]
///
/// A snapshot of an empty collection is never served: `get` reports a miss
/// so that the next lookup goes back to the server.
#[derive(Debug, Default)]
pub struct CollectionCache {
    snapshot: Option<Snapshot>,
}

impl CollectionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<&Snapshot> {
        self.snapshot
            .as_ref()
            .filter(|s| !s.collection.is_empty())
    }

    /// Replace the snapshot, rebuilding the index from `collection`
    pub fn store(&mut self, collection: ResourceCollection) -> &Snapshot {
        let index = NameIndex::build(&collection);
        self.snapshot.insert(Snapshot { collection, index })
    }

    pub fn invalidate(&mut self) {
        self.snapshot = None;
    }

    pub fn is_cached(&self) -> bool {
        self.get().is_some()
    }
}
