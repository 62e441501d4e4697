//! GC statistics

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// GC statistics
///
/// Snapshot of what a collector host has done so far
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GcStats {
    /// Total number of collections
    pub collections: u64,

    /// Total time spent in GC (across all collections)
    pub total_collection_time: Duration,

    /// Total bytes allocated
    pub total_allocated: u64,

    /// Total bytes freed
    pub total_freed: u64,

    /// Bytes collected in last cycle
    pub last_collected: u64,

    /// Live heap bytes at snapshot time
    pub live_heap_bytes: u64,

    /// Peak live heap bytes
    pub peak_live_bytes: u64,

    /// Growth target in effect at snapshot time
    pub gc_percent: u32,
}

impl GcStats {
    /// Record a collection cycle
    pub fn record_collection(&mut self, duration: Duration, bytes_collected: u64) {
        self.collections += 1;
        self.total_collection_time += duration;
        self.last_collected = bytes_collected;
        self.total_freed += bytes_collected;
    }

    /// Record allocation
    pub fn record_allocation(&mut self, bytes: u64) {
        self.total_allocated += bytes;
    }
}
