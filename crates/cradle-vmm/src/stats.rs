//! Dispatch counters.

/// Running totals of dispatch outcomes since boot.
///
/// Dropped injections and unexpected channels are deliberate policy (no
/// retry, no requeue), so the counters are the only place those events are
/// visible besides the log.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    /// Virtual IRQs successfully injected.
    pub irqs_injected: u64,
    /// Virtual IRQs dropped on controller backpressure.
    pub irqs_dropped: u64,
    /// Notifications on channels with no binding.
    pub unexpected_channels: u64,
    /// Faults the decoder resolved.
    pub faults_resolved: u64,
    /// Faults the decoder could not resolve.
    pub faults_unresolved: u64,
}
