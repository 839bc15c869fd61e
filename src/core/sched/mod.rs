//! The selector: round-robin task switching and the fatal-error path.
//!
//! Everything here either runs inside the PendSV handler (`context_switch`,
//! called from the assembly in `port`) or requests that PendSV run
//! (`yield_now`). There is no priority and no notion of blocking: every
//! task on the run list gets a turn, in insertion order, forever.

pub(crate) mod run_list;

use core::fmt::Write;
use core::ptr::NonNull;
use core::sync::atomic::{AtomicPtr, Ordering};

use crate::core::config::CANARY_BYTE;
use crate::core::kernel;
use crate::core::task::Task;
use crate::core::types::StkElement;

/// Request a scheduling decision.
///
/// Pends PendSV and returns immediately; the actual switch happens when the
/// core takes the exception, which — because PendSV sits at the lowest
/// priority — is no later than when the caller's own context would next
/// yield the CPU anyway. Safe to call from thread mode or from an
/// interrupt handler; from an ISR, the switch is deferred until the core
/// returns to thread mode.
pub fn yield_now() {
    crate::port::pend_scheduler();
}

/// Called from the PendSV handler with the stack pointer the outgoing task
/// was just parked at. Returns the stack pointer of the task to resume.
///
/// Runs with interrupts effectively serialized against run-list mutation:
/// thread-mode code only inserts or removes tasks inside a critical
/// section, and PendSV's lowest priority means it cannot itself preempt one.
pub(crate) extern "C" fn context_switch(sp: *mut StkElement) -> *mut StkElement {
    // SAFETY: called only from the PendSV handler, which is serialized
    // against run-list mutation as described above.
    let mut current = unsafe { kernel::current() };
    unsafe { current.as_mut() }.sp_current = sp;

    if !kernel::is_main_task(current) {
        check_stack(current);
    }

    // SAFETY: `current` is linked into the run list (it is, by definition,
    // the task that was just running); PendSV reaches the run list without
    // a `CriticalSection` token for the same reason it reaches `current`.
    let next = unsafe { kernel::run_list_for_selector().next_after(current) };
    unsafe { kernel::set_current(next) };

    unsafe { next.as_ref() }.sp_current
}

/// Check the outgoing task's stack for overflow: the saved pointer must
/// still be within the stack, and the canary byte at its base must be
/// intact.
fn check_stack(task: NonNull<Task>) {
    // SAFETY: `task` is a live task pointer; `stack_bottom` and
    // `sp_current` were set by `create_task` and are never touched except
    // here and in `context_switch`.
    let task_ref = unsafe { task.as_ref() };

    if (task_ref.sp_current as usize) < (task_ref.stack_bottom as usize) {
        fatal_error(task.as_ptr().cast(), "stack overflow (sp below stack bottom)");
    }

    // SAFETY: `stack_bottom` points at the first byte of a stack this task
    // owns for its whole lifetime.
    let canary = unsafe { core::ptr::read(task_ref.stack_bottom) };
    if canary != CANARY_BYTE {
        fatal_error(task.as_ptr().cast(), "stack overflow (canary overwritten)");
    }
}

/// Byte-sink for fatal-error diagnostics, independent of `defmt`.
///
/// Defaults to a no-op. Firmware wires in a real sink (UART, semihosting,
/// whatever the board has) with [`set_panic_print`]; `fatal_error` calls
/// whatever is installed unconditionally, since `defmt` output requires a
/// debug probe that may not be attached.
type PanicPrintFn = fn(&str);

fn default_panic_print(_msg: &str) {}

static PANIC_PRINT: AtomicPtr<()> = AtomicPtr::new(default_panic_print as *mut ());

/// Install the byte-sink `fatal_error` writes its diagnostic through.
///
/// Must be safe to call from a context with interrupts already disabled
/// and no assumption that the rest of the system is still healthy — it
/// may be the last code this core ever runs.
pub fn set_panic_print(f: PanicPrintFn) {
    PANIC_PRINT.store(f as *mut (), Ordering::Release);
}

fn panic_print(msg: &str) {
    let raw = PANIC_PRINT.load(Ordering::Acquire);
    // SAFETY: the only values ever stored are `PanicPrintFn`s, via
    // `set_panic_print` or the `default_panic_print` initializer above.
    let f: PanicPrintFn = unsafe { core::mem::transmute(raw) };
    f(msg);
}

/// Fixed-size `core::fmt::Write` sink: `fatal_error` must not allocate.
struct FatalMsgBuf {
    buf: [u8; 96],
    len: usize,
}

impl FatalMsgBuf {
    fn new() -> Self {
        FatalMsgBuf { buf: [0; 96], len: 0 }
    }

    fn as_str(&self) -> &str {
        core::str::from_utf8(&self.buf[..self.len]).unwrap_or("")
    }
}

impl Write for FatalMsgBuf {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        let bytes = s.as_bytes();
        let n = (self.buf.len() - self.len).min(bytes.len());
        self.buf[self.len..self.len + n].copy_from_slice(&bytes[..n]);
        self.len += n;
        Ok(())
    }
}

/// Report an unrecoverable scheduler error and halt.
///
/// There is no recovery path for stack corruption or for a task resuming
/// after it should have been permanently removed: both indicate memory is
/// no longer trustworthy. Writes a diagnostic through both `defmt` (when
/// enabled) and [`panic_print`], then spins with interrupts disabled —
/// deliberately not a panic, since unwinding or `abort` would still have
/// to trust the corrupted stack.
pub(crate) fn fatal_error(task: *mut (), msg: &str) -> ! {
    crate::error!("fatal error for task {:x}: {}", task as u32, msg);

    let mut line = FatalMsgBuf::new();
    let _ = write!(line, "Fatal error for task {:#x}: {}\r\n", task as usize, msg);
    panic_print(line.as_str());

    // Gated so the fatal path can actually be driven from a host test:
    // an unconditional `loop {}` here would just hang the test harness.
    #[cfg(test)]
    panic!("{}", line.as_str());

    #[cfg(not(test))]
    {
        // SAFETY: disabling interrupts and never returning is always sound.
        #[cfg(target_arch = "arm")]
        unsafe {
            core::arch::asm!("cpsid i", options(nomem, nostack));
        }

        loop {
            #[cfg(target_arch = "arm")]
            cortex_m::asm::nop();
            #[cfg(not(target_arch = "arm"))]
            core::hint::spin_loop();
        }
    }
}

/// High-water-mark stack usage, in bytes, for a task created with
/// `stack-watermark` enabled.
///
/// Walks up from the stack's base while the canary byte is still intact;
/// the distance from where it stops to the top of the stack is how much of
/// the stack has ever been touched. Returns `0` for the main task, which
/// has no stack of its own to measure.
#[cfg(feature = "stack-watermark")]
pub fn stack_watermark(task: &Task) -> usize {
    if kernel::is_main_task(NonNull::from(task)) {
        return 0;
    }

    let mut ptr = task.stack_bottom;
    // SAFETY: `stack_bottom..stack_top` is the stack this task was created
    // with, painted in full by `create_task` under `stack-watermark`.
    while (ptr as usize) < (task.stack_top as usize) && unsafe { core::ptr::read(ptr) } == CANARY_BYTE {
        ptr = unsafe { ptr.add(1) };
    }
    (task.stack_top as usize) - (ptr as usize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::task::create_task;

    fn entry_noop(_: *mut ()) {}

    // Drives `check_stack` directly on a locally-owned `Task`, bypassing
    // `create_task`/the run list entirely, so this doesn't need to share
    // the singleton-serialization concern of the test below it.
    #[test]
    #[should_panic(expected = "stack overflow (canary overwritten)")]
    fn canary_corruption_triggers_fatal_path() {
        let mut stack = [0u8; 16];
        stack[0] = CANARY_BYTE;
        let mut task = Task::new();
        task.stack_bottom = stack.as_mut_ptr();
        task.sp_current = unsafe { stack.as_mut_ptr().add(8) }.cast::<StkElement>();

        stack[0] = 0x00; // overwrite the canary

        check_stack(NonNull::from(&mut task));
    }

    // The only test in this module that touches the process-wide run
    // list / `current` singleton; kept to one `#[test]` so the shared
    // static state it exercises is never driven by two threads at once.
    #[test]
    fn round_robin_visits_every_task_in_order_and_wraps() {
        static mut STK_A: [StkElement; 32] = [0; 32];
        static mut TASK_A: Task = Task::new();
        static mut STK_B: [StkElement; 32] = [0; 32];
        static mut TASK_B: Task = Task::new();

        create_task(
            unsafe { &mut *(&raw mut TASK_A) },
            unsafe { &mut *(&raw mut STK_A) },
            "a",
            entry_noop,
            core::ptr::null_mut(),
        )
        .unwrap();
        create_task(
            unsafe { &mut *(&raw mut TASK_B) },
            unsafe { &mut *(&raw mut STK_B) },
            "b",
            entry_noop,
            core::ptr::null_mut(),
        )
        .unwrap();

        let a_sp = unsafe { (*(&raw const TASK_A)).sp_current };
        let b_sp = unsafe { (*(&raw const TASK_B)).sp_current };
        let main_sentinel_sp = 0xDEAD_BEEFu32 as *mut StkElement;

        // main -> a
        assert_eq!(context_switch(main_sentinel_sp), a_sp);
        // a -> b
        assert_eq!(context_switch(a_sp), b_sp);
        // b -> main, wrapping around
        assert_eq!(context_switch(b_sp), main_sentinel_sp);
    }
}
