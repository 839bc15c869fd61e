//! Error types for cosched
//!
//! Most of this kernel's misuse surface is undefined behavior by design
//! (see the module docs on `sched`): it is either too cheap to be worth a
//! runtime check outside debug builds, or it is a stack/memory corruption
//! condition that is fatal rather than recoverable and therefore never
//! becomes a `Result`. `SchedError` exists only for the one boundary that is
//! both checkable and not fatal: calling a thread-mode-only entry point from
//! interrupt context.

/// Scheduler error type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedError {
    /// `create_task` was called from interrupt context.
    ///
    /// The run list is shared mutable state that list primitives mutate
    /// from thread mode, relying on PendSV's lowest priority to avoid
    /// preempting them. Touching it from a handler would race the selector.
    CreateTaskIsr,
}

/// Result type alias for scheduler operations.
pub type SchedResult<T> = Result<T, SchedError>;
