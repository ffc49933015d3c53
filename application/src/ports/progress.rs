//! Progress notification port
//!
//! Defines the interface for reporting progress during a council dispatch.

/// Callback for progress updates during a dispatch
///
/// Implementations live in the presentation layer and can display
/// progress in various ways (console spinner, logs, etc.)
pub trait DispatchProgress: Send + Sync {
    /// Called when a dispatch starts
    fn on_dispatch_start(&self, total_warriors: usize);

    /// Called when one warrior's call completes
    fn on_warrior_complete(&self, warrior: &str, success: bool);

    /// Called when the whole dispatch completes
    fn on_dispatch_complete(&self, answered: usize, total: usize);
}

/// No-op progress notifier for when progress reporting is not needed
pub struct NoProgress;

impl DispatchProgress for NoProgress {
    fn on_dispatch_start(&self, _total_warriors: usize) {}
    fn on_warrior_complete(&self, _warrior: &str, _success: bool) {}
    fn on_dispatch_complete(&self, _answered: usize, _total: usize) {}
}
