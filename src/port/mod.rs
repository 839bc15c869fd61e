//! Port layer: the ARMv7-M-specific PendSV handler and its two entry
//! points into the core, plus a do-nothing stand-in for host builds.
//!
//! Everything above this module reaches the hardware only through
//! [`set_pendsv_priority`] and [`pend_scheduler`]; no other module touches
//! `SCB` or inline assembly directly.

#[cfg(target_arch = "arm")]
pub mod cortex_m;

#[cfg(target_arch = "arm")]
pub use cortex_m::{pend_scheduler, set_pendsv_priority};

/// Host stand-in used by `cargo test` on a development machine, where
/// there is no PendSV exception and no stack-switching assembly to run.
/// Scheduler-logic tests call `core::sched::context_switch` directly
/// instead of relying on this to do anything.
#[cfg(not(target_arch = "arm"))]
pub mod host {
    pub fn set_pendsv_priority(_priority: u8) {}
    pub fn pend_scheduler() {}
}

#[cfg(not(target_arch = "arm"))]
pub use host::{pend_scheduler, set_pendsv_priority};
