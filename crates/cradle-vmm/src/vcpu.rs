//! Guest vCPU lifecycle state.

/// Logical state of the single guest vCPU, as tracked by the monitor.
///
/// Transitions are driven only by the monitor: startup moves the vCPU to
/// `Running`; a fault delivery moves it to `Trapped`; a resolved fault moves
/// it back to `Running`. An unresolved fault leaves it `Trapped` forever:
/// the reply that would resume it is never sent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum VcpuState {
    #[default]
    NotStarted,
    Running,
    Trapped,
}
