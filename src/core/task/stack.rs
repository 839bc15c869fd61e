//! Stack frame fabrication
//!
//! Builds the initial saved context for a task that has never run, so that
//! the first PendSV restore finds exactly what it would have found had the
//! task merely been switched out mid-execution.

use core::mem::size_of;

use crate::core::config::CANARY_BYTE;
use crate::core::types::{StkElement, TaskFn};

/// Exception-return code for a thread running on PSP with no FP frame.
///
/// Cortex-M4 Devices Generic User Guide, table 2.17 (EXC_RETURN encoding).
const EXC_RET_THREAD_PSP: u32 = 0xFFFF_FFFD;

/// Layout fabricated and restored by the PendSV handler.
///
/// Matches the two halves described in `core::sched`: `r4..r11` and
/// `exc_return` are pushed by software on every switch-out; `r0..r3, r12,
/// lr, pc, xpsr` are the frame the CPU itself stacks on exception entry. A
/// fresh task is fabricated as if it had just taken that hardware stacking,
/// so the two halves are laid out contiguously here even though only the
/// PendSV handler ever writes the hardware half for a task that has
/// actually run.
#[repr(C)]
struct SavedContext {
    r4: u32,
    r5: u32,
    r6: u32,
    r7: u32,
    r8: u32,
    r9: u32,
    r10: u32,
    r11: u32,
    exc_return: u32,
    r0: u32,
    r1: u32,
    r2: u32,
    r3: u32,
    r12: u32,
    lr: u32,
    pc: u32,
    xpsr: u32,
}

// The PendSV handler reaches `exc_return` by a fixed byte offset from the
// stack pointer it receives; keep that offset anchored to the field so the
// two never drift apart silently.
const EXC_RETURN_OFFSET: usize = core::mem::offset_of!(SavedContext, exc_return);
const _: () = assert!(EXC_RETURN_OFFSET == 8 * size_of::<u32>());
const _: () = assert!(size_of::<SavedContext>() == 17 * size_of::<u32>());

/// Bytes a fabricated frame occupies; the minimum a task stack must provide
/// before the configured reserved headroom.
pub(crate) const FRAME_SIZE_BYTES: usize = size_of::<SavedContext>();

/// Entry point reached by the first context restore of every non-main task.
///
/// Runs `entry(arg)` and, if it returns, removes the task from the run list
/// and yields on its behalf rather than falling off the end of the
/// function.
extern "C" fn trampoline(task: *mut crate::core::task::Task, entry: TaskFn, arg: *mut ()) -> ! {
    entry(arg);

    // SAFETY: `task` is the pointer this very frame was fabricated for; it
    // is still linked into the run list because it is, by definition, the
    // task currently executing.
    unsafe {
        crate::core::kernel::run_list_remove(core::ptr::NonNull::new_unchecked(task));
    }
    crate::core::sched::yield_now();

    // `yield_now` never returns to a task that just removed itself.
    crate::core::sched::fatal_error(task.cast(), "task resumed after self-termination")
}

/// Fabricate the initial stack frame for `task` and return its stack
/// pointer (the value to store in `Task::sp_current`).
///
/// `stack` is painted with the canary byte (or fully, under
/// `stack-watermark`) before the frame is written into its top.
///
/// # Safety
/// `stack` must be valid for the lifetime of the task and large enough to
/// hold a `SavedContext` plus the configured reserved headroom; callers
/// enforce the size precondition (see `core::task::create_task`).
pub(crate) unsafe fn fabricate(
    task: *mut crate::core::task::Task,
    entry: TaskFn,
    arg: *mut (),
    stack: &mut [StkElement],
) -> *mut StkElement {
    let base = stack.as_mut_ptr().cast::<u8>();
    let len_bytes = stack.len() * size_of::<StkElement>();

    #[cfg(feature = "stack-watermark")]
    {
        // SAFETY: `base..base+len_bytes` is exactly `stack`.
        unsafe { core::ptr::write_bytes(base, CANARY_BYTE, len_bytes) };
    }
    #[cfg(not(feature = "stack-watermark"))]
    {
        // SAFETY: `base` is the first byte of `stack`.
        unsafe { core::ptr::write(base, CANARY_BYTE) };
    }

    // Top of stack, 8-byte aligned downward, then room for the frame.
    let top = (base as usize + len_bytes) & !7;
    let sp = (top - size_of::<SavedContext>()) as *mut SavedContext;

    // SAFETY: `sp` falls within `stack` by construction (the size
    // precondition guarantees `len_bytes >= size_of::<SavedContext>() +
    // CFG_RESERVED_HEADROOM`), and is suitably aligned since `SavedContext`
    // is `#[repr(C)]` of `u32`s and `top` is 8-byte aligned.
    unsafe {
        sp.write(SavedContext {
            r4: 0,
            r5: 0,
            r6: 0,
            r7: 0,
            r8: 0,
            r9: 0,
            r10: 0,
            r11: 0,
            exc_return: EXC_RET_THREAD_PSP,
            r0: task as u32,
            r1: entry as usize as u32,
            r2: arg as u32,
            r3: 0,
            r12: 0,
            lr: 0,
            pc: trampoline as usize as u32,
            xpsr: 1 << 24,
        });
    }

    sp.cast::<StkElement>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::task::Task;

    fn entry(_: *mut ()) {}

    #[test]
    fn fabricate_aligns_paints_canary_and_fills_frame() {
        let mut stack = [0u32; 32];
        let mut task = Task::new();
        let arg = 0x1234_5678usize as *mut ();

        let sp = unsafe { fabricate(&mut task as *mut Task, entry, arg, &mut stack) };

        assert_eq!((sp as usize) % 8, 0, "fabricated sp must be 8-byte aligned");
        assert!((sp as usize) >= stack.as_ptr() as usize);
        assert!((sp as usize) + size_of::<SavedContext>() <= stack.as_ptr() as usize + stack.len() * 4);

        let canary = unsafe { core::ptr::read(stack.as_ptr().cast::<u8>()) };
        assert_eq!(canary, CANARY_BYTE);

        let ctx = unsafe { &*sp.cast::<SavedContext>() };
        assert_eq!(ctx.r0, &mut task as *mut Task as u32);
        assert_eq!(ctx.r1, entry as usize as u32);
        assert_eq!(ctx.r2, arg as u32);
        assert_eq!(ctx.exc_return, EXC_RET_THREAD_PSP);
        assert_eq!(ctx.pc, trampoline as usize as u32);
        assert_eq!(ctx.xpsr, 1 << 24);
        assert_eq!(ctx.lr, 0);
    }

    #[test]
    #[cfg(not(feature = "stack-watermark"))]
    fn fabricate_only_paints_the_base_byte_without_watermark() {
        let mut stack = [0xFFFF_FFFFu32; 16];
        let mut task = Task::new();

        let _ = unsafe { fabricate(&mut task as *mut Task, entry, core::ptr::null_mut(), &mut stack) };

        // Only the very first byte is the canary; the rest of the stack
        // below the fabricated frame is left untouched.
        let second_byte = unsafe { core::ptr::read(stack.as_ptr().cast::<u8>().add(1)) };
        assert_eq!(second_byte, 0xFF);
    }
}
