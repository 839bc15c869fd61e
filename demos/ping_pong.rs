//! Two tasks yielding back and forth, plus the implicit main task.
//!
//! Demonstrates that `main` itself is a task on this scheduler: it never
//! calls a separate "start" function, it simply joins the run list by
//! calling `yield_now` like everything else.

#![no_std]
#![no_main]

use cortex_m_rt::entry;
use cosched::{create_task, StkElement};

static mut PING_STK: [StkElement; 256] = [0; 256];
static mut PING_TCB: cosched::Task = cosched::Task::new();
static mut PONG_STK: [StkElement; 256] = [0; 256];
static mut PONG_TCB: cosched::Task = cosched::Task::new();

fn ping_task(_: *mut ()) {
    loop {
        cosched::info!("ping");
        cosched::yield_now();
    }
}

fn pong_task(_: *mut ()) {
    loop {
        cosched::info!("pong");
        cosched::yield_now();
    }
}

#[entry]
fn main() -> ! {
    cosched::init();

    create_task(
        unsafe { &mut *(&raw mut PING_TCB) },
        unsafe { &mut *(&raw mut PING_STK) },
        "ping",
        ping_task,
        core::ptr::null_mut(),
    )
    .expect("ping task creation failed");

    create_task(
        unsafe { &mut *(&raw mut PONG_TCB) },
        unsafe { &mut *(&raw mut PONG_STK) },
        "pong",
        pong_task,
        core::ptr::null_mut(),
    )
    .expect("pong task creation failed");

    loop {
        cosched::info!("main");
        cosched::yield_now();
    }
}
