// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! The trait user actors implement. See [`Actor`].

use crate::thread::EventThread;

/// A unit of state whose methods execute serially on one thread.
///
/// Implement this on any `Send + 'static` struct, then wrap it in an
/// [`ActorHandle`] and attach it to an [`EventThread`]. Both hooks default to no-ops
/// and run on the thread that performs the attach/detach, with exclusive access to
/// the actor.
///
/// # Example
///
/// ```
/// use evthread::{Actor, ActorHandle, EventThread};
///
/// struct Counter {
///     count: u64,
/// }
///
/// impl Counter {
///     fn add(&mut self, n: u64) { self.count += n; }
/// }
///
/// impl Actor for Counter {}
///
/// let thread = EventThread::new("counter");
/// let counter = ActorHandle::new(Counter { count: 0 });
/// counter.attach(&thread);
/// counter.call(Counter::add, 5).unwrap(); // queued; runs once the loop drains
/// # counter.detach();
/// ```
pub trait Actor: Send + 'static {
    /// Runs right after this actor is bound to `thread`.
    fn on_attach(&mut self, thread: &EventThread) {
        let _ = thread;
    }

    /// Runs right after this actor is unbound from its thread (its queued closures
    /// are already purged at this point).
    fn on_detach(&mut self) {}
}
