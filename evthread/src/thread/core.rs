// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Shared per-thread state: the bounded event queue, the drain machinery, and the
//! child-id set. See [`ThreadCore`].

use crate::registry::{self, ActorId};
use super::HandleScheme;
use std::cell::Cell;
use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// A closure queued for execution on the owning thread.
pub(crate) type QueuedFn = Box<dyn FnOnce() + Send>;

/// One queue slot: the owner's id (for purge-by-owner) plus the closure. The closure
/// moves out of the slot when a drain claims it; the emptied slot stays in place as a
/// position holder until the outermost drain pops its batch.
struct QueuedEvent {
    owner: ActorId,
    func: Option<QueuedFn>,
}

/// Loop parameters fixed before the loop starts.
#[derive(Debug, Clone, Copy)]
pub(crate) struct LoopConfig {
    pub period: Duration,
    pub scheme: HandleScheme,
}

// Address of the core whose drain() is executing on this OS thread's call stack
// right now (0 = none). Marks the dynamic extent of a drain so that only true
// call-stack reentrancy - a closure draining or detaching on its own core - skips
// the handling lock. Being on the core's designated OS thread is not enough: another
// thread may be running a batch concurrently via the public drain hook.
thread_local! {
    static ACTIVE_DRAIN: Cell<usize> = const { Cell::new(0) };
}

/// RAII scope marking this OS thread as inside `core`'s drain. Saves and restores
/// the previous value so a closure that drains a *different* core nests correctly.
struct DrainScope {
    prev: usize,
}

impl DrainScope {
    fn enter(core: &ThreadCore) -> Self {
        let prev = ACTIVE_DRAIN.get();
        ACTIVE_DRAIN.set(core as *const ThreadCore as usize);
        Self { prev }
    }
}

impl Drop for DrainScope {
    fn drop(&mut self) {
        ACTIVE_DRAIN.set(self.prev);
    }
}

/// Recovers the guard from a poisoned mutex.
///
/// A panicking queued closure can poison the actor's own body mutex, but never
/// leaves core state inconsistent: the queue lock is released around every closure
/// invocation, and the handling lock - which *is* held across the whole drain batch,
/// user code included - is only ever reacquired through the `ACTIVE_DRAIN` check,
/// never blindly from inside a closure.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// The state one event thread shares with every handle that can reach it: the public
/// [`EventThread`], the actors attached to it, and the loop itself.
///
/// # Queue Discipline
///
/// [`enqueue()`] is O(1) under the queue lock and silently drops the event once the
/// queue holds `queue_bound` entries (lossy back-pressure; the drop is counted in
/// [`dropped_event_count()`]). [`drain()`] consumes the events that were queued at the
/// moment it started - never the ones enqueued while it runs, which are deferred to a
/// later drain (or claimed by a nested one).
///
/// # Reservation Counter
///
/// A drain claims its batch by bumping `reserved` before executing anything, and
/// leaves the claimed slots in the queue (emptied in place) until the outermost drain
/// pops them. A closure that itself calls drain therefore sees `queue length -
/// reserved` unclaimed entries and batches exactly those, so no event can run twice
/// and batches stay contiguous from the front of the queue.
///
/// # Lock Order
///
/// child set, then handling, then queue; the registry's exclusive lock is taken by
/// itself after the queue lock is released. Only a drain or purge initiated from
/// *inside* a closure of this core's own in-flight batch skips the handling lock:
/// the `ACTIVE_DRAIN` thread-local marks the dynamic extent of each `drain()`
/// call, so true call-stack reentrancy is distinguished from a plain call on the
/// owning OS thread (which must still serialize against a batch another thread may
/// be running through the public drain hook).
///
/// [`EventThread`]: super::EventThread
/// [`dropped_event_count()`]: Self::dropped_event_count
/// [`drain()`]: Self::drain
/// [`enqueue()`]: Self::enqueue
pub(crate) struct ThreadCore {
    name: String,
    running: AtomicBool,
    config: Mutex<LoopConfig>,
    queue_bound: AtomicUsize,
    queue: Mutex<VecDeque<QueuedEvent>>,
    /// Held across an entire drain batch; also taken by detach to serialize purges
    /// against in-flight batches.
    handling: Mutex<()>,
    /// Number of queue slots claimed by drains that have not popped yet. Only mutated
    /// while the handling lock is held, by the outer drain that owns it or by drains
    /// nested inside that batch's closures.
    reserved: AtomicUsize,
    /// Slots executed but not yet popped; popped in bulk when `reserved` returns to 0.
    finished: AtomicUsize,
    children: Mutex<HashSet<ActorId>>,
    dropped_events: AtomicU64,
}

impl ThreadCore {
    pub(crate) fn new(name: String) -> Self {
        Self {
            name,
            running: AtomicBool::new(false),
            config: Mutex::new(LoopConfig {
                period: Duration::from_millis(1),
                scheme: HandleScheme::AfterTask,
            }),
            queue_bound: AtomicUsize::new(1000),
            queue: Mutex::new(VecDeque::new()),
            handling: Mutex::new(()),
            reserved: AtomicUsize::new(0),
            finished: AtomicUsize::new(0),
            children: Mutex::new(HashSet::new()),
            dropped_events: AtomicU64::new(0),
        }
    }

    pub(crate) fn name(&self) -> &str { &self.name }

    pub(crate) fn is_running(&self) -> bool { self.running.load(Ordering::SeqCst) }

    pub(crate) fn set_running(&self, running: bool) {
        self.running.store(running, Ordering::SeqCst);
    }

    pub(crate) fn loop_config(&self) -> LoopConfig { *lock(&self.config) }

    pub(crate) fn set_period(&self, period: Duration) {
        lock(&self.config).period = period;
    }

    pub(crate) fn set_scheme(&self, scheme: HandleScheme) {
        lock(&self.config).scheme = scheme;
    }

    pub(crate) fn set_queue_bound(&self, bound: usize) {
        self.queue_bound.store(bound, Ordering::Relaxed);
    }

    pub(crate) fn queue_len(&self) -> usize { lock(&self.queue).len() }

    pub(crate) fn dropped_event_count(&self) -> u64 {
        self.dropped_events.load(Ordering::Relaxed)
    }

    /// Whether this call sits inside a closure of this core's own in-flight drain
    /// batch (true call-stack reentrancy, not merely the owning OS thread).
    fn in_active_drain(&self) -> bool {
        ACTIVE_DRAIN.get() == self as *const Self as usize
    }

    /// Adds `id` to the child set. Called by attach, before the registry insert.
    pub(crate) fn adopt_child(&self, id: ActorId) {
        lock(&self.children).insert(id);
    }

    /// Queues `func` under `owner`'s id.
    ///
    /// Returns `false` without queueing when `owner` is not (or no longer) a child of
    /// this thread, or when the queue is at its bound. The child check and the push
    /// happen under one child-set lock acquisition, so an enqueue can never slip in
    /// between a detach's child removal and its queue purge.
    pub(crate) fn enqueue(&self, owner: ActorId, func: QueuedFn) -> bool {
        let children = lock(&self.children);
        if !children.contains(&owner) {
            return false;
        }
        let mut queue = lock(&self.queue);
        if queue.len() >= self.queue_bound.load(Ordering::Relaxed) {
            self.dropped_events.fetch_add(1, Ordering::Relaxed);
            tracing::trace!(thread = %self.name, %owner, "event queue full, dropping event");
            return false;
        }
        queue.push_back(QueuedEvent { owner, func: Some(func) });
        true
    }

    /// Drains the events queued at the moment this call starts, in FIFO order.
    ///
    /// Events enqueued while the batch runs - including ones pushed by an executing
    /// closure - are left for a later drain. A closure that calls drain itself gets an
    /// inner batch of exactly those deferred events. The queue lock is only held to
    /// claim each slot, so enqueues proceed while closures run.
    pub(crate) fn drain(&self) {
        let nested = self.in_active_drain();
        let _handling = if nested { None } else { Some(lock(&self.handling)) };
        let _scope = DrainScope::enter(self);

        let (start, batch) = {
            let queue = lock(&self.queue);
            let reserved = self.reserved.load(Ordering::Relaxed);
            (reserved, queue.len().saturating_sub(reserved))
        };
        if batch == 0 {
            return;
        }
        self.reserved.fetch_add(batch, Ordering::Relaxed);

        for offset in 0..batch {
            let func = {
                let mut queue = lock(&self.queue);
                queue.get_mut(start + offset).and_then(|event| event.func.take())
            };
            // An emptied slot here means the owner detached mid-batch (from this very
            // thread) and the closure was purged in place.
            if let Some(func) = func {
                func();
            }
        }

        self.reserved.fetch_sub(batch, Ordering::Relaxed);
        self.finished.fetch_add(batch, Ordering::Relaxed);
        if self.reserved.load(Ordering::Relaxed) == 0 {
            let done = self.finished.swap(0, Ordering::Relaxed);
            let mut queue = lock(&self.queue);
            for _ in 0..done {
                queue.pop_front();
            }
        }
    }

    /// Severs `id` from this thread: removes it from the child set, purges its queued
    /// closures, and erases it from the registry.
    ///
    /// Callers outside this core's own in-flight drain batch block here until that
    /// batch completes, which is what guarantees that a closure of `id` either
    /// finishes before detach returns or never runs at all. A detach issued from a
    /// closure *of* the batch already holds the handling lock through its drain and
    /// purges in place instead.
    pub(crate) fn detach_actor(&self, id: ActorId) {
        {
            let mut children = lock(&self.children);
            if !children.remove(&id) {
                return;
            }
        }
        let _handling = if self.in_active_drain() { None } else { Some(lock(&self.handling)) };
        self.purge(id);
        registry::global().remove(id);
        tracing::debug!(thread = %self.name, %id, "actor detached");
    }

    /// Drops every queued closure owned by `id`. Slots already claimed by an active
    /// drain batch keep their queue position (the batch indexes into the queue) but
    /// lose their closure, so they cannot run.
    fn purge(&self, id: ActorId) {
        let reserved = self.reserved.load(Ordering::Relaxed);
        let mut queue = lock(&self.queue);
        let mut index = 0;
        let mut purged = 0_usize;
        queue.retain_mut(|event| {
            let claimed = index < reserved;
            index += 1;
            if event.owner != id {
                return true;
            }
            purged += 1;
            if claimed {
                event.func = None;
                true
            } else {
                false
            }
        });
        if purged > 0 {
            tracing::trace!(thread = %self.name, %id, purged, "purged queued events");
        }
    }
}

impl std::fmt::Debug for ThreadCore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThreadCore")
            .field("name", &self.name)
            .field("running", &self.is_running())
            .field("queue_len", &self.queue_len())
            .finish_non_exhaustive()
    }
}

