//! Collector host traits

use std::sync::Arc;

use crate::GcResult;

/// Identifier handed out when a cycle hook is registered
pub type HookId = u64;

/// Zero-argument callback fired after every completed collection cycle
pub type CycleHook = Arc<dyn Fn() + Send + Sync>;

/// Collector host
///
/// The three primitives a runtime has to expose for its collector to be
/// tuned from the outside: a completion notification, a live-heap query and
/// the relative growth target ("GC percent").
///
/// Hooks run on whichever thread finished the cycle. Implementations must not
/// hold internal locks while invoking them, so a hook may call back into the
/// host.
pub trait CollectorHost: Send + Sync {
    /// Register a hook to be invoked after each collection cycle
    ///
    /// # Errors
    ///
    /// Returns an error if the host no longer accepts registrations
    fn register_cycle_hook(&self, hook: CycleHook) -> GcResult<HookId>;

    /// Remove a previously registered hook
    ///
    /// # Errors
    ///
    /// Returns [`GcError::HookNotFound`](crate::GcError::HookNotFound) for an unknown id
    fn unregister_cycle_hook(&self, id: HookId) -> GcResult<()>;

    /// Bytes currently reachable and retained by the heap
    fn live_heap_bytes(&self) -> u64;

    /// Set the growth target, returning the previous one
    fn set_gc_percent(&self, percent: u32) -> u32;

    /// Current growth target
    fn gc_percent(&self) -> u32;

    /// Get host name
    fn name(&self) -> &str {
        "collector"
    }
}
