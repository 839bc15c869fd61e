//! Cortex-M3/M4 port: the PendSV handler and its two hardware knobs.
//!
//! `PendSV` is the only hand-written assembly in this crate. It saves the
//! software half of the outgoing task's context (on whichever stack,
//! MSP or PSP, that task was using), hands the stack pointer to
//! [`crate::core::sched::context_switch`], and restores the incoming
//! task's context from whatever it returns — which may be the other stack
//! entirely, since the main task runs on MSP and every other task on PSP.

#![allow(named_asm_labels)]

use core::arch::naked_asm;

use cortex_m::peripheral::scb::SystemHandler;

/// Set PendSV to the given exception priority.
pub fn set_pendsv_priority(priority: u8) {
    // SAFETY: `steal` is sound here because this runs once, from
    // `cosched::init`, before any other code touches the SCB.
    let mut scb = unsafe { cortex_m::Peripherals::steal() }.SCB;
    unsafe { scb.set_priority(SystemHandler::PendSV, priority) };
}

/// Pend the PendSV exception and ensure the pend is visible before
/// returning, per the Cortex-M recommendation for triggering exceptions
/// from thread mode.
#[inline(always)]
pub fn pend_scheduler() {
    cortex_m::peripheral::SCB::set_pendsv();
    cortex_m::asm::dsb();
    cortex_m::asm::isb();
}

// Cortex-M4 Devices Generic User Guide, table 2.17 (EXC_RETURN encoding).
// Bit 2 selects PSP (set) vs MSP (clear); bit 4, when clear, means the
// frame includes the extended FP state.
const EXC_RET_MSP_BIT: u32 = 1 << 2;
#[cfg(feature = "fpu")]
const EXC_RET_FP_BIT: u32 = 1 << 4;

#[cfg(not(feature = "fpu"))]
#[unsafe(naked)]
#[no_mangle]
pub unsafe extern "C" fn PendSV() {
    naked_asm!(
        "isb",
        "tst lr, {msp_bit}",
        "bne store_to_psp",

        // Outgoing task was on MSP (the main task).
        "push {{r4-r11, lr}}",
        "mov r0, sp",
        "b do_ctx_sw",

        "store_to_psp:",
        "mrs r0, psp",
        "stmdb r0!, {{r4-r11, lr}}",

        "do_ctx_sw:",
        "dsb",
        "bl {context_switch}",
        "ldr r1, [r0, #(8*4)]",
        "tst r1, {msp_bit}",
        "bne restore_from_psp",

        // Incoming task resumes on MSP.
        "mov sp, r0",
        "pop {{r4-r11, lr}}",
        "isb",
        "bx lr",

        "restore_from_psp:",
        "ldmia r0!, {{r4-r11, lr}}",
        "msr psp, r0",
        "isb",
        "bx lr",

        msp_bit = const EXC_RET_MSP_BIT,
        context_switch = sym crate::core::sched::context_switch,
    );
}

#[cfg(feature = "fpu")]
#[unsafe(naked)]
#[no_mangle]
pub unsafe extern "C" fn PendSV() {
    naked_asm!(
        "isb",
        "tst lr, {msp_bit}",
        "bne store_to_psp",

        // Outgoing task was on MSP (the main task).
        "tst lr, {fp_bit}",
        "it eq",
        "vpusheq {{s16-s31}}",
        "push {{r4-r11, lr}}",
        "mov r0, sp",
        "b do_ctx_sw",

        "store_to_psp:",
        "mrs r0, psp",
        "tst lr, {fp_bit}",
        "it eq",
        "vstmdbeq r0!, {{s16-s31}}",
        "stmdb r0!, {{r4-r11, lr}}",

        "do_ctx_sw:",
        "dsb",
        "bl {context_switch}",
        "ldr r1, [r0, #(8*4)]",
        "tst r1, {msp_bit}",
        "bne restore_from_psp",

        // Incoming task resumes on MSP.
        "mov sp, r0",
        "pop {{r4-r11, lr}}",
        "tst lr, {fp_bit}",
        "it eq",
        "vpopeq {{s16-s31}}",
        "isb",
        "bx lr",

        "restore_from_psp:",
        "ldmia r0!, {{r4-r11, lr}}",
        "tst lr, {fp_bit}",
        "it eq",
        "vldmiaeq r0!, {{s16-s31}}",
        "msr psp, r0",
        "isb",
        "bx lr",

        msp_bit = const EXC_RET_MSP_BIT,
        fp_bit = const EXC_RET_FP_BIT,
        context_switch = sym crate::core::sched::context_switch,
    );
}
