//! Compile-time configuration for cosched
//!
//! These constants control the behavior and resource limits of the scheduler.

/// Sentinel byte painted at the base of every non-main task's stack.
///
/// A mismatch here at a context-switch boundary means the task wrote past
/// the bottom of its stack.
pub const CANARY_BYTE: u8 = 0xA5;

/// Lowest possible exception priority on an ARMv7-M core (8-bit priority
/// field, fully implemented). Used for PendSV so that every other exception,
/// including SysTick, preempts a scheduling transition in progress.
pub const PENDSV_PRIORITY_LOWEST: u8 = 0xFF;

/// Bytes of headroom a stack must carry beyond `size_of::<SavedContext>()`.
///
/// `create_task`'s precondition (`stack_size >= size_of::<SavedContext>() +
/// CFG_RESERVED_HEADROOM`) is checked only in debug builds; see
/// `core::error::SchedError` and the fatal-error path in `core::sched`.
pub const CFG_RESERVED_HEADROOM: usize = 8;
