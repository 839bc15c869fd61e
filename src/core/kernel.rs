//! Global scheduler state and initialization
//!
//! Holds the two singletons the rest of the crate works against: the main
//! task (the permanent head of the run list) and the process-wide `current`
//! pointer. Both are tied to the single hardware core this design targets;
//! there is no per-core instance.

use core::ptr::NonNull;
use core::sync::atomic::{AtomicBool, Ordering};

use crate::core::config::PENDSV_PRIORITY_LOWEST;
use crate::core::critical::critical_section;
use crate::core::cs_cell::CsCell;
use crate::core::sched::run_list::RunList;
use crate::core::task::Task;

/// The main task: the permanent head of the run list.
///
/// Represents whichever thread-mode code called `cosched::init` and is still
/// executing it — typically `main`. It carries no stack bookkeeping of its
/// own (`stack_bottom` stays null) because it is never checked for overflow
/// and never had a frame fabricated for it: its "stack" is whatever MSP the
/// startup code gave it.
static mut MAIN_TASK: Task = Task::new();

const fn main_task_ptr() -> NonNull<Task> {
    // SAFETY: the address of a static is never null; forming the pointer
    // here does not alias or dereference anything.
    unsafe { NonNull::new_unchecked(&raw mut MAIN_TASK) }
}

/// Process-wide scheduler state, reached only through a [`CsCell`].
struct KernelState {
    run_list: RunList,
    current: NonNull<Task>,
}

// SAFETY: the only handle to `KernelState` is through `KERNEL`, a `CsCell`,
// which only ever hands out `&mut KernelState` to a caller already holding a
// `CriticalSection` (or running on the PendSV path, which is serialized
// against mutation by construction — see `core::sched`).
unsafe impl Send for KernelState {}

static KERNEL: CsCell<KernelState> = CsCell::new(KernelState {
    run_list: RunList::new(main_task_ptr()),
    current: main_task_ptr(),
});

static INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Initialize the scheduler.
///
/// Sets the PendSV priority to the architectural lowest so that every other
/// exception, including SysTick, preempts a scheduling transition in
/// progress. Must be called before interrupts are enabled and before the
/// first `yield_now`.
///
/// Calling this twice is a logic error. Debug builds catch it with a
/// `debug_assert!`; release builds simply re-apply the priority, consistent
/// with this crate's policy of not paying for precondition checks at
/// runtime outside debug (see `core::error`).
pub fn init() {
    let was_initialized = INITIALIZED.swap(true, Ordering::AcqRel);
    debug_assert!(!was_initialized, "cosched::init called more than once");

    crate::port::set_pendsv_priority(PENDSV_PRIORITY_LOWEST);
    crate::debug!("cosched initialized");
}

/// Insert a task at the tail of the run list. Thread-mode only.
pub(crate) unsafe fn run_list_insert(task: NonNull<Task>) {
    critical_section(|cs| KERNEL.get(cs).run_list.insert(task));
}

/// Remove a task from the run list. Thread-mode only; a no-op if absent.
pub(crate) unsafe fn run_list_remove(task: NonNull<Task>) {
    critical_section(|cs| KERNEL.get(cs).run_list.remove(task));
}

/// Borrow the run list for traversal from the PendSV path.
///
/// # Safety requirement upheld by callers
/// Only sound from contexts serialized against run-list mutation; see
/// [`current`].
pub(crate) unsafe fn run_list_for_selector() -> &'static RunList {
    &unsafe { KERNEL.get_unchecked() }.run_list
}

/// Fetch the currently-running task pointer.
///
/// # Safety
/// Callable without a `CriticalSection` token only from contexts already
/// serialized against run-list mutation: the PendSV handler path, or
/// thread-mode code that itself holds the critical section.
pub(crate) unsafe fn current() -> NonNull<Task> {
    unsafe { KERNEL.get_unchecked() }.current
}

/// Store the new currently-running task pointer. See [`current`] for the
/// safety contract.
pub(crate) unsafe fn set_current(task: NonNull<Task>) {
    unsafe { KERNEL.get_unchecked() }.current = task;
}

/// Returns `true` if `task` is the permanent head (the main task).
pub(crate) fn is_main_task(task: NonNull<Task>) -> bool {
    task == main_task_ptr()
}
