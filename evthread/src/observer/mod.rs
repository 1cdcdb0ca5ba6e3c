// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Self-scheduling periodic work pinned to an actor's thread.
//!
//! A [`LoopObserver`] is an actor whose `tick` re-enqueues itself each loop
//! iteration while observing, giving it one callback per iteration of its affinity
//! thread without touching the thread's own task hook. The [`Timer`] is the shipped
//! observer: a set of scheduled tasks with period and time-to-live, fired through
//! actor references so dead targets drop fires silently.

mod loop_observer;
mod timer;

pub use loop_observer::*;
pub use timer::*;

#[cfg(test)]
mod tests;
