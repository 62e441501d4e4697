//! Error types for the collector host surface

use crate::HookId;

/// GC operation result type
pub type GcResult<T> = Result<T, GcError>;

/// Errors that can occur while talking to a collector host
#[derive(Debug, thiserror::Error)]
pub enum GcError {
    /// The host no longer accepts hook registrations
    #[error("Collector host is closed")]
    HostClosed,

    /// No hook is registered under the given id
    #[error("Cycle hook not found: {0}")]
    HookNotFound(HookId),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_closed_display() {
        assert_eq!(GcError::HostClosed.to_string(), "Collector host is closed");
    }

    #[test]
    fn test_hook_not_found() {
        let err = GcError::HookNotFound(42);
        assert!(err.to_string().contains("42"));
    }
}
