// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! The event handling scheme and the per-loop hook trait. See [`HandleScheme`] and
//! [`LoopHooks`].

use strum_macros::Display;

/// Policy for how a thread interleaves its periodic task with queue drains.
///
/// | Scheme             | Per iteration                                    |
/// | :----------------- | :----------------------------------------------- |
/// | [`AfterTask`]      | `task()`, then drain                             |
/// | [`BeforeTask`]     | drain, then `task()`                             |
/// | [`UserControlled`] | `task()` only; the user drains explicitly        |
///
/// Under [`UserControlled`] nothing drains the queue unless user code calls
/// [`EventThread::drain_queued_events()`] - otherwise the queue grows to its bound and
/// silently drops further enqueues.
///
/// [`AfterTask`]: Self::AfterTask
/// [`BeforeTask`]: Self::BeforeTask
/// [`EventThread::drain_queued_events()`]: super::EventThread::drain_queued_events
/// [`UserControlled`]: Self::UserControlled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum HandleScheme {
    /// Run the periodic task, then drain queued events.
    AfterTask,
    /// Drain queued events, then run the periodic task.
    BeforeTask,
    /// Run the periodic task only; the user calls
    /// [`EventThread::drain_queued_events()`] explicitly.
    ///
    /// [`EventThread::drain_queued_events()`]: super::EventThread::drain_queued_events
    UserControlled,
}

/// Per-loop lifecycle hooks, injected into an [`EventThread`] via
/// [`EventThread::with_hooks()`].
///
/// This replaces subclassing: instead of deriving from the thread type and overriding
/// virtual methods, you hand the thread a value that implements this trait. All three
/// hooks default to no-ops, and all three run **on the loop thread**:
///
/// - [`on_start()`] runs once, before the first iteration.
/// - [`task()`] runs every iteration, ordered against the drain by [`HandleScheme`].
/// - [`on_terminate()`] runs once, after the loop exits.
///
/// # Trait Bounds - [`Send`] + `'static`
///
/// The hook value moves into the spawned OS thread, so it must be [`Send`] and own its
/// data (`'static`). No [`Sync`] is needed - the loop thread owns it exclusively.
///
/// [`EventThread::with_hooks()`]: super::EventThread::with_hooks
/// [`EventThread`]: super::EventThread
/// [`on_start()`]: Self::on_start
/// [`on_terminate()`]: Self::on_terminate
/// [`task()`]: Self::task
pub trait LoopHooks: Send + 'static {
    /// Runs once on the loop thread before the first iteration.
    fn on_start(&mut self) {}

    /// The periodic task. Runs every loop iteration.
    fn task(&mut self) {}

    /// Runs once on the loop thread after the loop exits.
    fn on_terminate(&mut self) {}
}

/// Default hooks for threads that only drain events.
#[derive(Debug, Default)]
pub(crate) struct NoopHooks;

impl LoopHooks for NoopHooks {}
