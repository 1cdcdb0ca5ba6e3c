// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Scheduled tasks on top of the loop observer. See [`Timer`].

use super::LoopObserver;
use crate::actor::{Actor, ActorRef, UntypedActorRef};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// `ttl` value for tasks that fire until removed.
pub const CONTINUOUS: i64 = -1;

/// A timer actor: an ordered set of scheduled tasks checked once per loop iteration
/// of its affinity thread.
///
/// Attach a `Timer` to a thread like any actor, then start it with
/// [`observer::start()`] (or [`Timer::start()`]). On each tick, tasks are visited in
/// id order; every task whose deadline has passed fires its callback **through its
/// target reference** - so a detached target silently swallows the fire - then
/// advances its deadline by the period and burns one unit of time-to-live. A task
/// whose ttl reaches zero is removed after the tick.
///
/// A `period` of zero means "fire every tick", i.e. as fast as the host thread's
/// loop runs - the tick itself still paces it, so it never busy-spins.
///
/// Adding a task under an id that is already present replaces the old task.
///
/// Because tasks fire from `on_tick`, which runs as a queued closure on the timer's
/// own thread, [`add_task()`] / [`remove_task()`] called from other threads must go
/// through the timer's reference (e.g. `timer_ref.run(|t| t.remove_task(0))`) like
/// any other actor method. Mutating the timer directly is only safe before its
/// handle is created.
///
/// [`add_task()`]: Self::add_task
/// [`observer::start()`]: super::start
/// [`remove_task()`]: Self::remove_task
pub struct Timer {
    observing: bool,
    tasks: BTreeMap<i64, TimerTask>,
}

/// One scheduled task. The callback is pre-bound to its target reference so firing
/// is a plain dispatch.
struct TimerTask {
    fire: Box<dyn Fn() -> bool + Send>,
    period: Duration,
    next_fire: Instant,
    /// Remaining fires; [`CONTINUOUS`] (or any negative value) means unbounded.
    ttl: i64,
}

impl Timer {
    #[must_use]
    pub fn new() -> Self {
        Self { observing: false, tasks: BTreeMap::new() }
    }

    /// Schedules `callback` against a typed target: on each fire the callback is
    /// queued onto `target`'s thread with exclusive access to the target actor.
    /// Method handles (`fn(&mut A)`) and closures both fit the callback parameter.
    ///
    /// The first fire is due one `period` after this call. `ttl` is the number of
    /// fires before the task removes itself; pass [`CONTINUOUS`] for unbounded. An
    /// existing task under `id` is replaced.
    pub fn add_task<A: Actor>(
        &mut self,
        id: i64,
        period: Duration,
        target: &ActorRef<A>,
        callback: impl Fn(&mut A) + Send + Sync + 'static,
        ttl: i64,
    ) {
        let target = target.clone();
        let callback = Arc::new(callback);
        let fire = Box::new(move || {
            let callback = Arc::clone(&callback);
            target.run(move |actor| (*callback)(actor))
        });
        self.insert_task(id, period, fire, ttl);
    }

    /// Schedules a free-standing `callback` against an untyped target. The closure
    /// runs on the target's thread under the target's id but gets no access to the
    /// target actor.
    pub fn add_task_untyped(
        &mut self,
        id: i64,
        period: Duration,
        target: &UntypedActorRef,
        callback: impl Fn() + Send + Sync + 'static,
        ttl: i64,
    ) {
        let target = target.clone();
        let callback = Arc::new(callback);
        let fire = Box::new(move || {
            let callback = Arc::clone(&callback);
            target.run(move || (*callback)())
        });
        self.insert_task(id, period, fire, ttl);
    }

    /// Removes the task under `id`, reporting whether it existed.
    pub fn remove_task(&mut self, id: i64) -> bool {
        self.tasks.remove(&id).is_some()
    }

    #[must_use]
    pub fn task_count(&self) -> usize { self.tasks.len() }

    /// Starts the timer ticking. Convenience for [`observer::start()`].
    ///
    /// [`observer::start()`]: super::start
    pub fn start(target: &ActorRef<Timer>) -> bool {
        super::start(target)
    }

    /// Stops the timer. Convenience for [`observer::stop()`].
    ///
    /// [`observer::stop()`]: super::stop
    pub fn stop(target: &ActorRef<Timer>) -> bool {
        super::stop(target)
    }

    fn insert_task(
        &mut self,
        id: i64,
        period: Duration,
        fire: Box<dyn Fn() -> bool + Send>,
        ttl: i64,
    ) {
        self.tasks.insert(
            id,
            TimerTask { fire, period, next_fire: Instant::now() + period, ttl },
        );
    }
}

impl Default for Timer {
    fn default() -> Self { Self::new() }
}

impl Actor for Timer {}

impl LoopObserver for Timer {
    fn is_observing(&self) -> bool { self.observing }

    fn set_observing(&mut self, observing: bool) { self.observing = observing; }

    fn on_tick(&mut self) {
        let now = Instant::now();
        let mut expired = Vec::new();

        for (id, task) in &mut self.tasks {
            if task.next_fire <= now {
                let delivered = (task.fire)();
                if !delivered {
                    tracing::trace!(task = id, "timer target gone, fire dropped");
                }
                task.next_fire += task.period;
                if task.ttl > 0 {
                    task.ttl -= 1;
                    if task.ttl == 0 {
                        expired.push(*id);
                    }
                }
            }
        }

        for id in expired {
            self.tasks.remove(&id);
        }
    }
}

impl fmt::Debug for Timer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Timer")
            .field("observing", &self.observing)
            .field("task_count", &self.tasks.len())
            .finish_non_exhaustive()
    }
}
