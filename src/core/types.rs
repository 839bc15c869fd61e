//! Core type definitions for cosched
//!
//! These types provide strong typing for the scheduler's primitives.

/// A single stack word, as referenced by the fabricator and the PendSV handler.
pub type StkElement = u32;

/// Task entry point function type.
///
/// Entry functions never return cleanly to their caller in the usual sense:
/// if they return, the trampoline removes the task from the run list and
/// yields on its behalf. The function signature itself is an ordinary `fn`,
/// not `-> !`, because returning is the normal way a task ends.
pub type TaskFn = fn(*mut ());
