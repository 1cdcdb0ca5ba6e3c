// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! The self-re-enqueueing observer trait and its start/stop operations. See
//! [`LoopObserver`].

use crate::actor::{Actor, ActorRef};

/// An actor that gets one callback per loop iteration of its affinity thread.
///
/// [`start()`] queues the first tick onto the affinity thread. Each tick calls
/// [`on_tick()`] and, while the observing flag is set, re-enqueues itself - the
/// re-enqueue lands behind the current drain batch, so exactly one tick runs per
/// iteration. [`stop()`] clears the flag; an in-flight tick sees it and does not
/// re-enqueue.
///
/// The flag accessors exist because ticks are delivered as queued closures that only
/// see `&mut Self`; keep them trivial (a `bool` field).
///
/// [`on_tick()`]: Self::on_tick
/// [`start()`]: start
/// [`stop()`]: stop
pub trait LoopObserver: Actor {
    fn is_observing(&self) -> bool;

    fn set_observing(&mut self, observing: bool);

    /// The periodic callback. Runs on the affinity thread, once per loop iteration
    /// while observing.
    fn on_tick(&mut self);
}

/// Starts observing: sets the flag and queues the first tick on the target's
/// affinity thread. Returns `false` when the target is detached or dropped.
pub fn start<T: LoopObserver>(target: &ActorRef<T>) -> bool {
    let tick_target = target.clone();
    target.run(move |observer| {
        observer.set_observing(true);
        schedule_tick(tick_target);
    })
}

/// Stops observing. The tick already queued (if any) still runs its liveness check
/// but will not call [`LoopObserver::on_tick()`] again or re-enqueue. Returns
/// `false` when the target is detached or dropped.
pub fn stop<T: LoopObserver>(target: &ActorRef<T>) -> bool {
    target.run(|observer| observer.set_observing(false))
}

/// Queues one tick. Runs on the affinity thread; re-enqueues itself while the
/// observing flag holds.
fn schedule_tick<T: LoopObserver>(target: ActorRef<T>) {
    let next = target.clone();
    target.run(move |observer| {
        if observer.is_observing() {
            observer.on_tick();
            schedule_tick(next);
        }
    });
}
