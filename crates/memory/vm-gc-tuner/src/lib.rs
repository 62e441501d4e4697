//! # VM GC Tuner
//!
//! Adaptive tuning of the collector's relative growth target ("GC percent").
//!
//! After every completed collection the tuner reads the live heap, computes how
//! much the heap may grow before the ceiling is reached, and writes that back
//! as the collector's GC percent. Low headroom means a small percent and more
//! frequent collections. Plenty of headroom means a large percent and the
//! collector stays out of the way.
//!
//! ```text
//! collector cycle done ─► GcTuner::on_collection_completed
//!          ▲                   │ live_heap_bytes()
//!          │                   ▼
//!          │            GcPercentPolicy::calc(live, ceiling)
//!          │                   │
//!          └── set_gc_percent ◄┘
//! ```
//!
//! ## Modules
//!
//! - [`percent`]: the pure percent calculation and its bounds
//! - [`tuner`]: [`GcTuner`], the feedback loop state and hook registration
//! - [`config`]: [`TunerConfig`], TOML-backed configuration
//! - [`poller`]: [`PollingDriver`], interval fallback for hosts without hooks
//!   (`async` feature)
//!
//! ## Usage
//!
//! ```
//! use std::sync::Arc;
//! use vm_gc::SimulatedCollector;
//! use vm_gc_tuner::GcTuner;
//!
//! let gc = Arc::new(SimulatedCollector::new());
//! let tuner = Arc::new(GcTuner::new(gc.clone(), 64 * 1024 * 1024));
//! tuner.install().unwrap();
//!
//! gc.set_live_bytes(16 * 1024 * 1024);
//! gc.collect();
//! assert_eq!(tuner.gc_percent(), 300);
//! ```

#![warn(missing_docs)]
#![warn(unused_imports)]

pub mod config;
pub mod error;
pub mod percent;
#[cfg(feature = "async")]
pub mod poller;
pub mod tuner;

pub use config::{DEFAULT_CEILING_RATIO, TunerConfig};
pub use error::{TunerError, TunerResult};
pub use percent::{
    DEFAULT_GC_PERCENT, GcPercentPolicy, MAX_GC_PERCENT, MIN_GC_PERCENT, calc_gc_percent,
};
#[cfg(feature = "async")]
pub use poller::PollingDriver;
pub use tuner::{GcTuner, TunerStats};
