// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Then/catch composition, thread hopping, and failure routing.

use crate::actor::{Actor, ActorHandle};
use crate::promise::Promise;
use crate::thread::EventThread;
use miette::miette;
use pretty_assertions::assert_eq;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc};

struct Scaler {
    factor: i64,
    applied: Arc<AtomicUsize>,
}

impl Actor for Scaler {}

impl Scaler {
    fn scale(&mut self, value: i64) -> miette::Result<i64> {
        self.applied.fetch_add(1, Ordering::SeqCst);
        Ok(value * self.factor)
    }
}

struct Failer;

impl Actor for Failer {}

impl Failer {
    fn explode(&mut self, _value: i64) -> miette::Result<i64> {
        Err(miette!("not implemented"))
    }
}

struct Collector {
    values: mpsc::Sender<i64>,
    errors: mpsc::Sender<String>,
}

impl Actor for Collector {}

/// A scaling actor plus the counter of how many times it actually ran.
fn scaler(factor: i64) -> (ActorHandle<Scaler>, Arc<AtomicUsize>) {
    let applied = Arc::new(AtomicUsize::new(0));
    let handle = ActorHandle::new(Scaler { factor, applied: Arc::clone(&applied) });
    (handle, applied)
}

fn collector() -> (ActorHandle<Collector>, mpsc::Receiver<i64>, mpsc::Receiver<String>) {
    let (value_tx, value_rx) = mpsc::channel();
    let (err_tx, err_rx) = mpsc::channel();
    let handle = ActorHandle::new(Collector { values: value_tx, errors: err_tx });
    (handle, value_rx, err_rx)
}

#[test]
fn values_thread_through_successive_links() {
    let thread = EventThread::new("chain");
    let (double, _) = scaler(2);
    let (triple, _) = scaler(3);
    double.attach(&thread);
    triple.attach(&thread);
    let (tail, values, _errors) = collector();
    tail.attach(&thread);

    Promise::new(&double.typed_ref(), Scaler::scale)
        .then(&triple.typed_ref(), Scaler::scale)
        .then(&tail.typed_ref(), |tail: &mut Collector, value| {
            tail.values.send(value).ok();
            Ok(())
        })
        .execute(7);

    // One hop per drain: head, then, tail.
    thread.drain_queued_events();
    thread.drain_queued_events();
    thread.drain_queued_events();

    assert_eq!(values.try_recv().unwrap(), 42);

    double.detach();
    triple.detach();
    tail.detach();
}

#[test]
fn links_hop_between_threads() {
    let first = EventThread::new("hop-first");
    let second = EventThread::new("hop-second");
    let (left, _) = scaler(10);
    let (right, _) = scaler(100);
    left.attach(&first);
    right.attach(&second);
    let (tail, values, _errors) = collector();
    tail.attach(&second);

    Promise::new(&left.typed_ref(), Scaler::scale)
        .then(&right.typed_ref(), Scaler::scale)
        .then(&tail.typed_ref(), |tail: &mut Collector, value| {
            tail.values.send(value).ok();
            Ok(())
        })
        .execute(1);

    assert_eq!(first.queue_len(), 1);
    assert_eq!(second.queue_len(), 0);

    first.drain_queued_events(); // head runs on "first", successor hops
    assert_eq!(first.queue_len(), 0);
    assert_eq!(second.queue_len(), 1);

    second.drain_queued_events();
    second.drain_queued_events();
    assert_eq!(values.try_recv().unwrap(), 1000);

    left.detach();
    right.detach();
    tail.detach();
}

#[test]
fn error_routes_to_catch_and_stops_the_chain() {
    let thread = EventThread::new("catch");
    let (adder, adder_applied) = scaler(1);
    let failer = ActorHandle::new(Failer);
    let (after, after_applied) = scaler(5);
    adder.attach(&thread);
    failer.attach(&thread);
    after.attach(&thread);
    let (handler, _values, errors) = collector();
    handler.attach(&thread);

    Promise::new(&adder.typed_ref(), Scaler::scale)
        .then(&failer.typed_ref(), Failer::explode)
        .then(&after.typed_ref(), Scaler::scale)
        .catch(&handler.typed_ref(), |handler: &mut Collector, report| {
            handler.errors.send(report.to_string()).ok();
        })
        .execute(1);

    for _ in 0..5 {
        thread.drain_queued_events();
    }

    assert_eq!(errors.try_recv().unwrap(), "not implemented");
    // The link before the failure ran; the one after it never did.
    assert_eq!(adder_applied.load(Ordering::SeqCst), 1);
    assert_eq!(after_applied.load(Ordering::SeqCst), 0);
    assert_eq!(thread.queue_len(), 0);

    adder.detach();
    failer.detach();
    after.detach();
    handler.detach();
}

#[test]
fn catch_handler_runs_on_the_catch_targets_thread() {
    let work = EventThread::new("work");
    let supervise = EventThread::new("supervise");
    let failer = ActorHandle::new(Failer);
    failer.attach(&work);
    let (handler, _values, errors) = collector();
    handler.attach(&supervise);

    Promise::new(&failer.typed_ref(), Failer::explode)
        .catch(&handler.typed_ref(), |handler: &mut Collector, report| {
            handler.errors.send(report.to_string()).ok();
        })
        .execute(0);

    work.drain_queued_events();
    // The handler was enqueued on the supervisor thread, not run inline.
    assert!(errors.try_recv().is_err());
    assert_eq!(supervise.queue_len(), 1);

    supervise.drain_queued_events();
    assert_eq!(errors.try_recv().unwrap(), "not implemented");

    failer.detach();
    handler.detach();
}

#[test]
fn uncaught_error_is_fatal_on_the_executing_thread() {
    let thread = EventThread::new("fatal");
    let failer = ActorHandle::new(Failer);
    failer.attach(&thread);

    Promise::new(&failer.typed_ref(), Failer::explode).execute(0);

    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        thread.drain_queued_events();
    }));
    assert!(result.is_err());

    failer.detach();
}

#[test]
fn detached_link_drops_the_chain_silently() {
    let thread = EventThread::new("dropped-chain");
    let (head, _) = scaler(2);
    let (gone, gone_applied) = scaler(3);
    head.attach(&thread);
    gone.attach(&thread);
    let (tail, values, _errors) = collector();
    tail.attach(&thread);

    Promise::new(&head.typed_ref(), Scaler::scale)
        .then(&gone.typed_ref(), Scaler::scale)
        .then(&tail.typed_ref(), |tail: &mut Collector, value| {
            tail.values.send(value).ok();
            Ok(())
        })
        .execute(1);

    // The middle target leaves before its hop is attempted.
    gone.detach();

    for _ in 0..4 {
        thread.drain_queued_events();
    }
    assert_eq!(gone_applied.load(Ordering::SeqCst), 0);
    assert!(values.try_recv().is_err());
    assert_eq!(thread.queue_len(), 0);

    head.detach();
    tail.detach();
}

#[test]
fn execute_without_then_runs_the_head_alone() {
    let thread = EventThread::new("single-link");
    let (solo, applied) = scaler(9);
    solo.attach(&thread);

    Promise::new(&solo.typed_ref(), Scaler::scale).execute(4);
    thread.drain_queued_events();

    assert_eq!(applied.load(Ordering::SeqCst), 1);

    solo.detach();
}
