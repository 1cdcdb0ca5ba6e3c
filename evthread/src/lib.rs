// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! # evthread
//!
//! An in-process actor runtime built on **periodic worker threads** with per-thread
//! FIFO event queues.
//!
//! Application logic lives in *actors*: plain structs implementing [`Actor`] whose
//! methods all execute serially on the one [`EventThread`] the actor is attached to.
//! Threads never call into each other's actors directly - a cross-thread invocation
//! is a closure enqueued onto the target actor's thread, picked up by that thread's
//! loop on its next drain.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │ EventThread "worker"              EventThread "main" (in place)  │
//! │ ┌─────────────────────────┐       ┌─────────────────────────┐    │
//! │ │ loop:                   │       │ loop:                   │    │
//! │ │   sleep → task → drain  │       │   sleep → task → drain  │    │
//! │ │   [FIFO event queue]    │◄──┐   │   [FIFO event queue]    │    │
//! │ └───────────▲─────────────┘   │   └──────────▲──────────────┘    │
//! │             │ owns            │              │ owns              │
//! │         actor W ──────────────┘          actor A                 │
//! │             (A's ref enqueues onto W's thread, and vice versa)   │
//! └──────────────────────────────────────────────────────────────────┘
//!            registry: ActorId → live cell  (RwLock, process-wide)
//! ```
//!
//! - [`EventThread`] - the periodic loop, its bounded queue, and the
//!   [`HandleScheme`] that orders the [`LoopHooks::task()`] hook against drains.
//! - [`ActorHandle`] / [`Actor`] - ownership, thread affinity (attach / detach /
//!   re-attach), queued dispatch with move semantics.
//! - [`ActorRef`] / [`UntypedActorRef`] - liveness-safe references that resolve
//!   through the process-wide registry by [`ActorId`]; dispatch to a detached actor
//!   is a silent no-op.
//! - [`LoopObserver`] / [`Timer`] - self-scheduling periodic callbacks and scheduled
//!   tasks with period and time-to-live.
//! - [`Promise`] - then/catch chains whose links hop between actor threads, moving
//!   the produced value across each hop.
//! - [`SharedCell`] - the read/write-locked escape hatch for state that actors
//!   genuinely share.
//!
//! # Example
//!
//! ```
//! use evthread::{Actor, ActorHandle, ActorRef, EventThread};
//! use std::sync::mpsc;
//!
//! struct Worker {
//!     sink: mpsc::Sender<u32>,
//! }
//! impl Actor for Worker {}
//! impl Worker {
//!     fn work(&mut self, amount: u32) {
//!         for n in 0..amount {
//!             self.sink.send(n).ok();
//!         }
//!     }
//! }
//!
//! let mut thread = EventThread::new("worker");
//! thread.set_loop_period(std::time::Duration::from_millis(1));
//!
//! let (tx, rx) = mpsc::channel();
//! let worker = ActorHandle::new(Worker { sink: tx });
//! worker.attach(&thread);
//!
//! thread.start().unwrap();
//! worker.call(Worker::work, 3).unwrap();
//! assert_eq!(rx.recv().unwrap(), 0); // delivered by the worker thread
//! # worker.detach();
//! # thread.stop();
//! ```
//!
//! # Delivery Model
//!
//! Queues are bounded (default 1000) and **lossy**: an enqueue against a full queue
//! is silently dropped and only counted in [`EventThread::dropped_event_count()`].
//! FIFO order holds per thread per drain batch; there is no cross-thread ordering.
//! Detach is the coarse cancellation primitive - it purges every queued closure of
//! the detaching actor and invalidates all its references at once.

pub mod actor;
pub mod observer;
pub mod promise;
pub mod registry;
pub mod shared_cell;
pub mod thread;

pub use actor::*;
// The observer start/stop free functions stay namespaced (`observer::start(&r)`).
pub use observer::{LoopObserver, Timer, CONTINUOUS};
pub use promise::*;
// Id-based discovery stays namespaced (`registry::find(id)`).
pub use registry::{ActorId, ObjectRegistry};
pub use shared_cell::*;
pub use thread::*;
