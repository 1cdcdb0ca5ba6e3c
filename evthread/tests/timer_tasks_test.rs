// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Timer lifecycle over a real main-thread loop: a repeating task, a one-shot that
//! removes it, and a one-shot that stops the main thread.

use evthread::{Actor, ActorHandle, EventThread, Timer, CONTINUOUS};
use pretty_assertions::assert_eq;
use serial_test::serial;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

struct Target {
    fires: Arc<AtomicUsize>,
}

impl Actor for Target {}

impl Target {
    fn bump(&mut self) {
        self.fires.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
#[serial]
fn repeating_task_fires_until_removed_then_main_stops() {
    let mut main = EventThread::new("timer-main");
    main.set_loop_period(Duration::from_millis(1));

    let fires = Arc::new(AtomicUsize::new(0));
    let target = ActorHandle::new(Target { fires: Arc::clone(&fires) });
    target.attach(&main);
    let timer = ActorHandle::new(Timer::new());
    timer.attach(&main);

    let target_ref = target.typed_ref();
    let timer_ref = timer.typed_ref();
    timer
        .run({
            let timer_ref = timer_ref.clone();
            move |t| {
                // Fires at ~50/100/150 ms; removed at ~180 ms, so exactly 3 fires.
                t.add_task(0, Duration::from_millis(50), &target_ref, Target::bump, CONTINUOUS);
                t.add_task(
                    1,
                    Duration::from_millis(180),
                    &timer_ref,
                    |t: &mut Timer| {
                        t.remove_task(0);
                    },
                    1,
                );
                t.add_task_untyped(
                    2,
                    Duration::from_millis(280),
                    &timer_ref.untyped(),
                    || {
                        EventThread::stop_main_thread().ok();
                    },
                    1,
                );
            }
        })
        .unwrap();
    Timer::start(&timer_ref);

    main.start_main().unwrap();

    assert_eq!(fires.load(Ordering::SeqCst), 3);

    timer.detach();
    target.detach();
}
