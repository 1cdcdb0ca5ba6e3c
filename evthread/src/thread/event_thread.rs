// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! The public event thread type and its loop. See [`EventThread`].

use super::core::{lock, LoopConfig, ThreadCore};
use super::{HandleScheme, LoopHooks, NoopHooks};
use std::sync::{Arc, Mutex, OnceLock};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// The slot holding the core of the designated main thread, if any. Assigned by
/// [`EventThread::start_main()`], cleared when that loop exits.
fn main_slot() -> &'static Mutex<Option<Arc<ThreadCore>>> {
    static MAIN: OnceLock<Mutex<Option<Arc<ThreadCore>>>> = OnceLock::new();
    MAIN.get_or_init(|| Mutex::new(None))
}

/// A periodic worker thread with a bounded FIFO event queue.
///
/// Actors attach to an `EventThread` and from then on every one of their methods runs
/// on it, delivered as closures through the queue. The loop sleeps until the next
/// deadline on a monotonic clock, advances the deadline by the period, and then runs
/// the periodic [`task()`] hook and/or drains the queue according to the
/// [`HandleScheme`]. Deadlines drift forward deterministically: a slow tick is
/// followed by immediate back-to-back ticks until the loop catches up - periods are
/// never skipped.
///
/// # Configuration
///
/// [`set_loop_period()`], [`set_loop_freq()`], [`set_scheme()`] and
/// [`set_queue_bound()`] only apply while the thread is not running; a call on a
/// running thread is logged and ignored.
///
/// # Main Thread
///
/// At most one thread may run as *main*: [`start_main()`] runs the loop **in place**
/// on the calling OS thread and blocks until [`stop_main_thread()`] is called (from a
/// queued closure or another thread). Every other thread gets its own OS thread via
/// [`start()`].
///
/// # Shutdown
///
/// [`stop()`] clears the running flag and joins the OS thread; it is idempotent. The
/// iteration in flight finishes its task and drain batch first. Enqueues after stop
/// still land in the queue - they are drained only if the same instance is started
/// again.
///
/// [`HandleScheme`]: super::HandleScheme
/// [`set_loop_freq()`]: Self::set_loop_freq
/// [`set_loop_period()`]: Self::set_loop_period
/// [`set_queue_bound()`]: Self::set_queue_bound
/// [`set_scheme()`]: Self::set_scheme
/// [`start()`]: Self::start
/// [`start_main()`]: Self::start_main
/// [`stop()`]: Self::stop
/// [`stop_main_thread()`]: Self::stop_main_thread
/// [`task()`]: super::LoopHooks::task
#[allow(missing_debug_implementations)]
pub struct EventThread {
    core: Arc<ThreadCore>,
    hooks: Option<Box<dyn LoopHooks>>,
    join: Option<JoinHandle<Box<dyn LoopHooks>>>,
}

impl EventThread {
    /// Creates a thread with no-op hooks. Defaults: 1 ms period,
    /// [`HandleScheme::AfterTask`], queue bound 1000.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_hooks(name, NoopHooks)
    }

    /// Creates a thread with user [`LoopHooks`] providing the periodic task.
    #[must_use]
    pub fn with_hooks(name: impl Into<String>, hooks: impl LoopHooks) -> Self {
        Self {
            core: Arc::new(ThreadCore::new(name.into())),
            hooks: Some(Box::new(hooks)),
            join: None,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str { self.core.name() }

    #[must_use]
    pub fn is_running(&self) -> bool { self.core.is_running() }

    /// Sets the loop period. Ignored while running.
    pub fn set_loop_period(&mut self, period: Duration) {
        if self.guard_not_running("set_loop_period") {
            self.core.set_period(period);
        }
    }

    /// Sets the loop period from a frequency in Hz. Ignored while running or when
    /// `freq` is not a positive finite number.
    pub fn set_loop_freq(&mut self, freq: f64) {
        if !(freq.is_finite() && freq > 0.0) {
            tracing::warn!(thread = %self.name(), freq, "ignoring non-positive loop frequency");
            return;
        }
        if self.guard_not_running("set_loop_freq") {
            self.core.set_period(Duration::from_secs_f64(1.0 / freq));
        }
    }

    /// Sets the event handling scheme. Ignored while running.
    pub fn set_scheme(&mut self, scheme: HandleScheme) {
        if self.guard_not_running("set_scheme") {
            self.core.set_scheme(scheme);
        }
    }

    /// Sets the queue bound. Ignored while running.
    pub fn set_queue_bound(&mut self, bound: usize) {
        if self.guard_not_running("set_queue_bound") {
            self.core.set_queue_bound(bound);
        }
    }

    /// Starts the loop on a new OS thread. A second start while running is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`StartError::ThreadSpawn`] when the OS refuses to spawn the thread.
    pub fn start(&mut self) -> Result<(), StartError> {
        if self.core.is_running() {
            return Ok(());
        }
        self.reap_finished_run();
        self.core.set_running(true);

        let core = Arc::clone(&self.core);
        let mut hooks = self.hooks.take().unwrap_or_else(|| Box::new(NoopHooks));
        let spawned = thread::Builder::new()
            .name(self.core.name().to_owned())
            .spawn(move || {
                run_loop(&core, hooks.as_mut());
                hooks
            });
        match spawned {
            Ok(join) => {
                self.join = Some(join);
                Ok(())
            }
            Err(source) => {
                self.core.set_running(false);
                Err(StartError::ThreadSpawn { name: self.core.name().to_owned(), source })
            }
        }
    }

    /// Clears the running flag and joins the OS thread. Idempotent; the in-flight
    /// iteration (task plus its drain batch) completes first.
    pub fn stop(&mut self) {
        self.core.set_running(false);
        self.reap_finished_run();
    }

    /// Runs the loop on the **calling** thread, blocking until
    /// [`stop_main_thread()`] is called.
    ///
    /// # Errors
    ///
    /// Returns [`MainThreadError::AlreadyAssigned`] when another thread currently
    /// runs as main.
    ///
    /// [`stop_main_thread()`]: Self::stop_main_thread
    pub fn start_main(&mut self) -> Result<(), MainThreadError> {
        if self.core.is_running() {
            return Ok(());
        }
        {
            let mut slot = lock(main_slot());
            if slot.is_some() {
                return Err(MainThreadError::AlreadyAssigned);
            }
            *slot = Some(Arc::clone(&self.core));
        }
        self.core.set_running(true);

        let mut hooks = self.hooks.take().unwrap_or_else(|| Box::new(NoopHooks));
        run_loop(&self.core, hooks.as_mut());
        self.hooks = Some(hooks);

        lock(main_slot()).take();
        Ok(())
    }

    /// Signals the designated main thread's loop to exit.
    ///
    /// # Errors
    ///
    /// Returns [`MainThreadError::NotAssigned`] when no thread runs as main.
    pub fn stop_main_thread() -> Result<(), MainThreadError> {
        match lock(main_slot()).as_ref() {
            Some(core) => {
                core.set_running(false);
                Ok(())
            }
            None => Err(MainThreadError::NotAssigned),
        }
    }

    /// Drains the events queued at this moment. The external half of
    /// [`HandleScheme::UserControlled`]; also safe to call from any thread (batches
    /// from different callers serialize on the handling lock) or reentrantly from a
    /// queued closure.
    pub fn drain_queued_events(&self) {
        self.core.drain();
    }

    /// Current queue depth. Diagnostics only.
    #[must_use]
    pub fn queue_len(&self) -> usize { self.core.queue_len() }

    /// Number of events dropped because the queue was at its bound.
    #[must_use]
    pub fn dropped_event_count(&self) -> u64 { self.core.dropped_event_count() }

    pub(crate) fn core(&self) -> &Arc<ThreadCore> { &self.core }

    fn guard_not_running(&self, what: &str) -> bool {
        if self.core.is_running() {
            tracing::warn!(thread = %self.name(), what, "configuration ignored while running");
            return false;
        }
        true
    }

    /// Joins a finished (or finishing) loop thread and takes its hooks back so a
    /// later [`start()`] can reuse this instance.
    ///
    /// [`start()`]: Self::start
    fn reap_finished_run(&mut self) {
        if let Some(join) = self.join.take() {
            match join.join() {
                Ok(hooks) => self.hooks = Some(hooks),
                Err(_panic) => {
                    tracing::error!(thread = %self.core.name(), "event thread loop panicked");
                }
            }
        }
    }
}

impl Drop for EventThread {
    fn drop(&mut self) {
        if self.core.is_running() {
            tracing::warn!(
                thread = %self.core.name(),
                "EventThread dropped while running; stop() should be called first"
            );
        }
        self.stop();
    }
}

/// The loop proper. Runs on the OS thread owned by `core` - spawned for normal
/// threads, the caller's own for the main thread.
fn run_loop(core: &Arc<ThreadCore>, hooks: &mut dyn LoopHooks) {
    let LoopConfig { period, scheme } = core.loop_config();
    tracing::debug!(thread = %core.name(), ?period, %scheme, "event loop starting");

    let mut next_tick = Instant::now() + period;
    hooks.on_start();

    while core.is_running() {
        // A deadline already in the past sleeps zero: overrun iterations fire
        // back-to-back until the loop catches up.
        thread::sleep(next_tick.saturating_duration_since(Instant::now()));
        next_tick += period;

        match scheme {
            HandleScheme::AfterTask => {
                hooks.task();
                core.drain();
            }
            HandleScheme::BeforeTask => {
                core.drain();
                hooks.task();
            }
            HandleScheme::UserControlled => hooks.task(),
        }
    }

    hooks.on_terminate();
    tracing::debug!(thread = %core.name(), "event loop stopped");
}

/// Errors from [`EventThread::start()`].
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum StartError {
    /// [`std::thread::Builder::spawn()`] failed.
    #[error("Failed to spawn event thread '{name}'")]
    #[diagnostic(
        code(evthread::thread::spawn),
        help(
            "The system may have reached its thread limit - \
             check `ulimit -u` for the per-user limit"
        )
    )]
    ThreadSpawn {
        /// The configured thread name.
        name: String,
        #[source]
        source: std::io::Error,
    },
}

/// Errors from the main-thread operations on [`EventThread`].
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum MainThreadError {
    /// [`EventThread::stop_main_thread()`] was called with no main designated.
    #[error("No event thread is assigned as main")]
    #[diagnostic(
        code(evthread::thread::main_not_assigned),
        help("A main thread is designated by calling `EventThread::start_main()`.")
    )]
    NotAssigned,

    /// A second [`EventThread::start_main()`] while one main loop is running.
    #[error("An event thread is already running as main")]
    #[diagnostic(
        code(evthread::thread::main_already_assigned),
        help("Only one thread may run as main at a time; stop the current one first.")
    )]
    AlreadyAssigned,
}
