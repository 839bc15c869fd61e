//! cosched: a minimal cooperative multitasking kernel for ARMv7-M
//!
//! A process-wide run list of tasks, round-robin scheduled, switched by a
//! hand-written PendSV handler. No priorities, no blocking primitives, no
//! timers — a task runs until it calls `yield_now` or returns.

#![no_std]
#![deny(unsafe_op_in_unsafe_fn)]

// ============ Critical Section ============

#[cfg(target_arch = "arm")]
mod cs_impl {
    use cortex_m::interrupt;
    use cortex_m::register::primask;
    use critical_section::{set_impl, Impl, RawRestoreState};

    struct SingleCoreCriticalSection;
    set_impl!(SingleCoreCriticalSection);

    unsafe impl Impl for SingleCoreCriticalSection {
        unsafe fn acquire() -> RawRestoreState {
            let was_active = primask::read().is_active();
            interrupt::disable();
            was_active
        }

        unsafe fn release(was_active: RawRestoreState) {
            if was_active {
                unsafe { interrupt::enable() }
            }
        }
    }
}

// ============ Modules ============

pub mod log;
mod lang_items;

pub mod core;
pub mod port;

// ============ Re-exports ============

pub use core::config;
pub use core::error::{SchedError, SchedResult};
pub use core::kernel::init;
pub use core::sched::{set_panic_print, yield_now};
#[cfg(feature = "stack-watermark")]
pub use core::sched::stack_watermark;
pub use core::task::{create_task, Task};
pub use core::types::{StkElement, TaskFn};
