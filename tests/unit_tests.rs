//! Integration tests for the public `cosched` API.
//!
//! Runs on the host, not the embedded target: `port::host` stands in for
//! the real PendSV/MSP-PSP plumbing, so these exercise task creation and
//! the run list through the same entry points a real firmware would use,
//! without ever firing an actual context switch.
//!
//! This file compiles to its own test binary (a separate process from the
//! crate's `--lib` unit tests), so the `std::sync::Mutex` below only needs
//! to serialize the tests *within* this file against each other.

use std::sync::Mutex;

use cosched::{config, create_task, SchedError, StkElement, Task};

/// `create_task` mutates the process-wide run list; cargo runs tests in
/// this binary on multiple threads by default, so every test touching it
/// takes this lock first.
static RUN_LIST_LOCK: Mutex<()> = Mutex::new(());

fn entry_noop(_: *mut ()) {}

#[test]
fn create_task_succeeds_on_a_well_sized_stack() {
    let _guard = RUN_LIST_LOCK.lock().unwrap();

    static mut STK: [StkElement; 32] = [0; 32];
    static mut TCB: Task = Task::new();

    let result = create_task(
        unsafe { &mut *(&raw mut TCB) },
        unsafe { &mut *(&raw mut STK) },
        "host-task",
        entry_noop,
        core::ptr::null_mut(),
    );

    assert!(result.is_ok());
    assert_eq!(unsafe { (*(&raw const TCB)).name }, "host-task");
}

#[test]
#[cfg_attr(not(debug_assertions), ignore)]
#[should_panic(expected = "stack too small")]
fn create_task_panics_on_an_undersized_stack_in_debug() {
    let _guard = RUN_LIST_LOCK.lock().unwrap();

    static mut STK: [StkElement; 4] = [0; 4];
    static mut TCB: Task = Task::new();

    let _ = create_task(
        unsafe { &mut *(&raw mut TCB) },
        unsafe { &mut *(&raw mut STK) },
        "too-small",
        entry_noop,
        core::ptr::null_mut(),
    );
}

#[test]
fn sched_error_is_comparable_and_debuggable() {
    assert_eq!(SchedError::CreateTaskIsr, SchedError::CreateTaskIsr);
    assert_eq!(format!("{:?}", SchedError::CreateTaskIsr), "CreateTaskIsr");
}

#[test]
fn config_constants_are_sane() {
    assert_eq!(config::CANARY_BYTE, 0xA5);
    assert_eq!(config::PENDSV_PRIORITY_LOWEST, 0xFF);
    assert!(config::CFG_RESERVED_HEADROOM > 0);
}
