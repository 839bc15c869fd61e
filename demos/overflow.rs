//! Deliberately overflows a task's stack to show the canary catching it.
//!
//! The recursive task is given a stack barely larger than one fabricated
//! frame; a handful of yields is enough for its call stack to walk past
//! the canary byte, which the selector catches on the task's next
//! switch-out and reports through `cosched::core::sched::fatal_error`.

#![no_std]
#![no_main]

use cortex_m_rt::entry;
use cosched::{create_task, StkElement};

static mut GREEDY_STK: [StkElement; 24] = [0; 24];
static mut GREEDY_TCB: cosched::Task = cosched::Task::new();

#[inline(never)]
fn recurse(depth: u32) {
    // Defeat tail-call optimization with a volatile read so each level
    // keeps its own frame on the stack.
    let depth = unsafe { core::ptr::read_volatile(&depth) };
    cosched::yield_now();
    recurse(depth + 1);
}

fn greedy_task(_: *mut ()) {
    recurse(0);
}

#[entry]
fn main() -> ! {
    cosched::init();

    create_task(
        unsafe { &mut *(&raw mut GREEDY_TCB) },
        unsafe { &mut *(&raw mut GREEDY_STK) },
        "greedy",
        greedy_task,
        core::ptr::null_mut(),
    )
    .expect("greedy task creation failed");

    loop {
        cosched::yield_now();
    }
}
