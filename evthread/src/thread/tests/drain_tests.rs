// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Queue and drain discipline tests, driven synchronously on the test thread.
//! Reentrancy is detected by the drain's own call-stack scope, so nested cases are
//! exercised simply by draining from inside a queued closure.

use crate::registry::ActorId;
use crate::thread::core::ThreadCore;
use pretty_assertions::assert_eq;
use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use std::time::Duration;

/// A fresh core with one adopted child id, ready to enqueue against.
fn core_with_child() -> (Arc<ThreadCore>, ActorId) {
    let core = Arc::new(ThreadCore::new("test-core".into()));
    let id = ActorId::next();
    core.adopt_child(id);
    (core, id)
}

/// Shared execution log the queued closures append to.
fn log() -> Arc<Mutex<Vec<&'static str>>> {
    Arc::new(Mutex::new(Vec::new()))
}

fn push(log: &Arc<Mutex<Vec<&'static str>>>, entry: &'static str) {
    log.lock().unwrap().push(entry);
}

#[test]
fn drain_runs_closures_in_fifo_order() {
    let (core, id) = core_with_child();
    let seen = log();
    for entry in ["a", "b", "c", "d"] {
        let seen = Arc::clone(&seen);
        assert!(core.enqueue(id, Box::new(move || push(&seen, entry))));
    }

    core.drain();

    assert_eq!(*seen.lock().unwrap(), vec!["a", "b", "c", "d"]);
    assert_eq!(core.queue_len(), 0);
}

#[test]
fn events_enqueued_during_drain_are_deferred() {
    let (core, id) = core_with_child();
    let seen = log();
    {
        let seen = Arc::clone(&seen);
        let core_inner = Arc::clone(&core);
        core.enqueue(
            id,
            Box::new(move || {
                push(&seen, "first");
                let seen = Arc::clone(&seen);
                core_inner.enqueue(id, Box::new(move || push(&seen, "late")));
            }),
        );
    }

    core.drain();
    assert_eq!(*seen.lock().unwrap(), vec!["first"]);
    assert_eq!(core.queue_len(), 1);

    core.drain();
    assert_eq!(*seen.lock().unwrap(), vec!["first", "late"]);
    assert_eq!(core.queue_len(), 0);
}

#[test]
fn second_drain_without_enqueues_is_empty() {
    let (core, id) = core_with_child();
    let seen = log();
    {
        let seen = Arc::clone(&seen);
        core.enqueue(id, Box::new(move || push(&seen, "only")));
    }

    core.drain();
    core.drain();

    assert_eq!(*seen.lock().unwrap(), vec!["only"]);
}

#[test]
fn reentrant_drain_claims_only_the_deferred_tail() {
    let (core, id) = core_with_child();
    let seen = log();

    // Outer batch: [a, b]. While "a" runs it enqueues "c" and drains reentrantly,
    // which must claim exactly [c] and leave "b" to the outer batch.
    {
        let seen_a = Arc::clone(&seen);
        let core_a = Arc::clone(&core);
        core.enqueue(
            id,
            Box::new(move || {
                push(&seen_a, "a");
                {
                    let seen_c = Arc::clone(&seen_a);
                    core_a.enqueue(id, Box::new(move || push(&seen_c, "c")));
                }
                core_a.drain();
            }),
        );
        let seen_b = Arc::clone(&seen);
        core.enqueue(id, Box::new(move || push(&seen_b, "b")));
    }

    core.drain();

    assert_eq!(*seen.lock().unwrap(), vec!["a", "c", "b"]);
    assert_eq!(core.queue_len(), 0);
}

#[test]
fn queue_bound_drops_overflow_silently() {
    let (core, id) = core_with_child();
    core.set_queue_bound(8);
    let seen = log();

    for _ in 0..10 {
        let seen = Arc::clone(&seen);
        core.enqueue(id, Box::new(move || push(&seen, "x")));
    }
    assert_eq!(core.queue_len(), 8);
    assert_eq!(core.dropped_event_count(), 2);

    core.drain();
    assert_eq!(seen.lock().unwrap().len(), 8);
    assert_eq!(core.queue_len(), 0);
}

#[test]
fn enqueue_for_unknown_owner_is_rejected() {
    let (core, _id) = core_with_child();
    let stranger = ActorId::next();
    assert!(!core.enqueue(stranger, Box::new(|| {})));
    assert_eq!(core.queue_len(), 0);
}

#[test]
fn detach_purges_queued_closures() {
    let (core, id) = core_with_child();
    let seen = log();
    for _ in 0..3 {
        let seen = Arc::clone(&seen);
        core.enqueue(id, Box::new(move || push(&seen, "never")));
    }

    core.detach_actor(id);
    core.drain();

    assert!(seen.lock().unwrap().is_empty());
    assert_eq!(core.queue_len(), 0);
}

#[test]
fn detach_from_inside_a_draining_closure_purges_in_place() {
    let (core, detacher) = core_with_child();
    let victim = ActorId::next();
    core.adopt_child(victim);
    let seen = log();

    // Batch: [detach(victim), victim's closure]. The second slot is already claimed
    // by the running batch, so the purge empties it in place and it must not run.
    {
        let core_inner = Arc::clone(&core);
        let seen_a = Arc::clone(&seen);
        core.enqueue(
            detacher,
            Box::new(move || {
                push(&seen_a, "detaching");
                core_inner.detach_actor(victim);
            }),
        );
        let seen_b = Arc::clone(&seen);
        core.enqueue(victim, Box::new(move || push(&seen_b, "victim-ran")));
    }

    core.drain();

    assert_eq!(*seen.lock().unwrap(), vec!["detaching"]);
    assert_eq!(core.queue_len(), 0);
}

#[test]
fn drain_from_another_thread_serializes_with_the_active_batch() {
    let (core, id) = core_with_child();
    let seen = log();
    let (started_tx, started_rx) = mpsc::channel();

    {
        let seen = Arc::clone(&seen);
        core.enqueue(
            id,
            Box::new(move || {
                push(&seen, "slow-start");
                started_tx.send(()).unwrap();
                thread::sleep(Duration::from_millis(50));
                push(&seen, "slow-end");
            }),
        );
    }

    let worker = {
        let core = Arc::clone(&core);
        thread::spawn(move || core.drain())
    };

    // The worker is mid-batch; an event enqueued now belongs to a later batch, and
    // this thread's drain must block on the handling lock until the batch is done -
    // being a different OS thread, it is an outer drain, never a nested one.
    started_rx.recv().unwrap();
    {
        let seen = Arc::clone(&seen);
        core.enqueue(id, Box::new(move || push(&seen, "late")));
    }
    core.drain();
    worker.join().unwrap();

    assert_eq!(*seen.lock().unwrap(), vec!["slow-start", "slow-end", "late"]);
    assert_eq!(core.queue_len(), 0);
}
