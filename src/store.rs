//! Publishing host table snapshots.

use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::table::HostTable;

//------------ SnapshotStore -------------------------------------------------

/// Holds the currently published host table.
///
/// A new table is published by swapping a single pointer. Readers load
/// that pointer without taking a lock and keep the table they loaded
/// alive for as long as they hold on to it, so they always see one
/// complete table and never a mix of two refresh cycles.
#[derive(Debug, Default)]
pub struct SnapshotStore {
    current: ArcSwap<HostTable>,
}

impl SnapshotStore {
    /// Creates a new store publishing the given table.
    pub fn new(table: HostTable) -> Self {
        SnapshotStore {
            current: ArcSwap::from_pointee(table),
        }
    }

    /// Replaces the current table.
    pub fn publish(&self, table: HostTable) {
        self.current.store(Arc::new(table));
    }

    /// Returns the table in effect right now.
    pub fn current(&self) -> Arc<HostTable> {
        self.current.load_full()
    }
}

//============ Testing =======================================================
