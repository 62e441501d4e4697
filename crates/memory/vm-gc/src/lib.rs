//! # VM Garbage Collection Host Crate
//!
//! This crate describes what the VM's collector exposes to code that wants to
//! steer it from the outside, without owning allocation or reclamation.
//!
//! ## Architecture
//!
//! ```text
//!   vm-gc-tuner
//!        ↓
//!     vm-gc (this crate)
//!        ↑
//!   collector implementations
//! ```
//!
//! ## Features
//!
//! - **traits**: [`CollectorHost`], the cycle-hook / live-heap / GC percent surface
//! - **simulated**: [`SimulatedCollector`], an in-process pacing model
//! - **stats**: GC statistics snapshots
//!
//! ## Usage
//!
//! ```
//! use std::sync::Arc;
//! use vm_gc::{CollectorHost, SimulatedCollector};
//!
//! let gc = SimulatedCollector::new();
//! gc.register_cycle_hook(Arc::new(|| println!("cycle done"))).unwrap();
//! gc.collect();
//! assert_eq!(gc.stats().collections, 1);
//! ```

#![warn(missing_docs)]
#![warn(unused_extern_crates)]
#![warn(unused_imports)]

pub mod error;
pub mod simulated;
pub mod stats;
pub mod traits;

// Re-export common types
pub use error::{GcError, GcResult};
pub use simulated::{INITIAL_GC_PERCENT, MIN_HEAP_GOAL, SimulatedCollector};
pub use stats::GcStats;
pub use traits::{CollectorHost, CycleHook, HookId};

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_host_behind_trait_object() {
        let host: Arc<dyn CollectorHost> = Arc::new(SimulatedCollector::new());
        assert_eq!(host.name(), "simulated");
        assert_eq!(host.gc_percent(), INITIAL_GC_PERCENT);
        assert_eq!(host.set_gc_percent(250), INITIAL_GC_PERCENT);
        assert_eq!(host.gc_percent(), 250);
    }

    #[test]
    fn test_stats_default() {
        let stats = GcStats::default();
        assert_eq!(stats.collections, 0);
    }
}
