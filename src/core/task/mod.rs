//! Task control blocks and task creation
//!
//! A task is a `Task` plus the stack it runs on. There is no deletion,
//! suspension, or priority here: a task exists from `create_task` until it
//! either loops forever or returns, at which point the trampoline removes
//! it from the run list for good.

mod stack;

use core::ptr::NonNull;

use crate::core::config::CFG_RESERVED_HEADROOM;
use crate::core::critical::is_isr_context;
use crate::core::error::{SchedError, SchedResult};
use crate::core::types::{StkElement, TaskFn};

/// A task's control block.
///
/// Lives for as long as the `'static` reference the caller of
/// [`create_task`] handed in — typically a `static mut` alongside its
/// stack, following the pattern in this crate's demo programs.
#[repr(C)]
pub struct Task {
    /// Saved stack pointer. Valid only while this task is not the one
    /// currently executing; the running task's true SP lives in the CPU.
    pub(crate) sp_current: *mut StkElement,
    /// Base (lowest address) of this task's stack, used for the canary
    /// check and, with `stack-watermark`, high-water-mark introspection.
    /// Null for the main task, which carries no stack of its own.
    pub(crate) stack_bottom: *mut u8,
    #[cfg(feature = "stack-watermark")]
    pub(crate) stack_top: *mut u8,
    pub(crate) next: Option<NonNull<Task>>,
    /// Diagnostic name, surfaced in logs and in the fatal-error path.
    pub name: &'static str,
}

// SAFETY: a `Task` is only ever touched from thread-mode code holding the
// critical section, or from the PendSV handler path, both of which are
// mutually exclusive by construction (see `core::kernel`, `core::sched`).
unsafe impl Send for Task {}
unsafe impl Sync for Task {}

impl Task {
    /// Construct an uninitialized task. Must be populated by
    /// [`create_task`] before the run list ever sees it; the zero state
    /// here exists only so it can sit in a `static`.
    pub const fn new() -> Self {
        Task {
            sp_current: core::ptr::null_mut(),
            stack_bottom: core::ptr::null_mut(),
            #[cfg(feature = "stack-watermark")]
            stack_top: core::ptr::null_mut(),
            next: None,
            name: "",
        }
    }
}

impl Default for Task {
    fn default() -> Self {
        Self::new()
    }
}

/// Create a task and add it to the run list.
///
/// `task` and `stack` must outlive the task itself, so they are required to
/// be `'static` — in practice a pair of `static mut` items, as in this
/// crate's demo programs. The task becomes eligible to run the next time
/// the scheduler runs; it does not preempt the caller.
///
/// # Errors
/// Returns [`SchedError::CreateTaskIsr`] if called from interrupt context;
/// the run list is only ever mutated from thread mode.
///
/// # Panics
/// In debug builds, panics if `stack` is too small to hold a fabricated
/// frame plus the configured reserved headroom. Release builds do not
/// check this; an undersized stack is caught, if at all, by the canary on
/// the task's first switch-out.
pub fn create_task(
    task: &'static mut Task,
    stack: &'static mut [StkElement],
    name: &'static str,
    entry: TaskFn,
    arg: *mut (),
) -> SchedResult<()> {
    if is_isr_context() {
        return Err(SchedError::CreateTaskIsr);
    }

    debug_assert!(
        stack.len() * core::mem::size_of::<StkElement>()
            >= stack::FRAME_SIZE_BYTES + CFG_RESERVED_HEADROOM,
        "stack too small for {name}"
    );

    task.name = name;
    task.stack_bottom = stack.as_mut_ptr().cast::<u8>();
    #[cfg(feature = "stack-watermark")]
    {
        task.stack_top = unsafe {
            stack
                .as_mut_ptr()
                .cast::<u8>()
                .add(stack.len() * core::mem::size_of::<StkElement>())
        };
    }
    task.next = None;

    let task_ptr = NonNull::from(&mut *task);
    // SAFETY: `task_ptr` is non-null and points at `task`, which we just
    // initialized above except for `sp_current`, written next.
    let sp = unsafe { stack::fabricate(task_ptr.as_ptr(), entry, arg, stack) };
    task.sp_current = sp;

    crate::debug!("task {} created", name);

    // SAFETY: `task_ptr` is valid and not already linked (fresh task).
    unsafe { crate::core::kernel::run_list_insert(task_ptr) };

    Ok(())
}
