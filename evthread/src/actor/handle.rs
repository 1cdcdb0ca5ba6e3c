// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! The owning handle for an actor. See [`ActorHandle`].

use super::{Actor, ActorCell, ActorRef, ErasedActorCell, UntypedActorRef};
use crate::registry::ActorId;
use crate::thread::EventThread;
use std::sync::{Arc, Weak};

/// The owner of one actor.
///
/// Wraps the user value, assigns it an [`ActorId`], and mediates its thread affinity.
/// Everything the owner can do to the actor goes through here: attach/detach, queued
/// dispatch, and minting [`ActorRef`]/[`UntypedActorRef`] for other actors to hold.
///
/// # Dispatch Is Queued, Arguments Move
///
/// [`call()`] and [`run()`] never invoke the method synchronously - they queue a
/// closure on the affinity thread. Arguments are moved into that closure and moved
/// onward into the method when it runs: constructed once by the caller, dropped once
/// after the method returns, with no hidden copies. Pass a clone when the caller
/// needs to keep the value.
///
/// # Dropping
///
/// Dropping the handle while the actor is attached is a programming error: it is
/// reported at `error!` level and the handle detaches the actor first, so the
/// registry and the thread's child set are left clean and none of its queued
/// closures can run afterwards.
///
/// [`call()`]: Self::call
/// [`run()`]: Self::run
#[allow(missing_debug_implementations)]
pub struct ActorHandle<A: Actor> {
    cell: Arc<ActorCell<A>>,
}

impl<A: Actor> ActorHandle<A> {
    /// Wraps `actor`, assigning it the next process-wide id. The actor starts
    /// unattached.
    #[must_use]
    pub fn new(actor: A) -> Self {
        Self { cell: ActorCell::new(actor) }
    }

    #[must_use]
    pub fn id(&self) -> ActorId { self.cell.actor_id() }

    #[must_use]
    pub fn is_attached(&self) -> bool { self.cell.is_attached() }

    /// Binds the actor to `thread`. Attaching while already attached re-attaches:
    /// the actor leaves its old thread (purging its queued closures there) and joins
    /// the new one atomically from the caller's point of view.
    pub fn attach(&self, thread: &EventThread) {
        self.cell.attach(thread);
    }

    /// Unbinds the actor from its thread, purging every queued closure that carries
    /// its id. A no-op when unattached.
    pub fn detach(&self) {
        self.cell.detach();
    }

    /// Queues a method invocation on the affinity thread: `method(&mut actor, arg)`.
    ///
    /// Methods taking several parameters take them as a tuple, or use [`run()`] with
    /// a closure. A full queue drops the invocation silently (by design - see
    /// [`EventThread::dropped_event_count()`]).
    ///
    /// # Errors
    ///
    /// [`DispatchError::NoAffinity`] when the actor is not attached to any thread.
    ///
    /// [`run()`]: Self::run
    pub fn call<P>(&self, method: fn(&mut A, P), arg: P) -> Result<(), DispatchError>
    where
        P: Send + 'static,
    {
        self.run(move |actor| method(actor, arg))
    }

    /// Queues an arbitrary closure over the actor on the affinity thread.
    ///
    /// # Errors
    ///
    /// [`DispatchError::NoAffinity`] when the actor is not attached to any thread.
    pub fn run(
        &self,
        f: impl FnOnce(&mut A) + Send + 'static,
    ) -> Result<(), DispatchError> {
        if !self.cell.is_attached() {
            return Err(DispatchError::NoAffinity { id: self.id() });
        }
        // false here means the queue bound dropped it or a detach raced in; both are
        // silent by contract.
        let _delivered = self.cell.try_enqueue(f);
        Ok(())
    }

    /// Mints a typed reference for other actors to dispatch through.
    #[must_use]
    pub fn typed_ref(&self) -> ActorRef<A> {
        ActorRef::new(self.id(), Arc::downgrade(&self.cell))
    }

    /// Mints an untyped reference: same liveness contract, closure-only dispatch.
    #[must_use]
    pub fn untyped_ref(&self) -> UntypedActorRef {
        let erased: Weak<dyn ErasedActorCell> = self.cell.weak_erased();
        UntypedActorRef::new(self.id(), erased)
    }
}

impl<A: Actor> Drop for ActorHandle<A> {
    fn drop(&mut self) {
        if self.cell.is_attached() {
            tracing::error!(
                id = %self.id(),
                "ActorHandle dropped while attached; detach() should be called first"
            );
            self.cell.detach();
        }
    }
}

/// Errors from dispatching through an [`ActorHandle`].
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum DispatchError {
    /// `call`/`run` on an actor with no affinity thread.
    #[error("{id} has no affinity thread")]
    #[diagnostic(
        code(evthread::actor::no_affinity),
        help("Attach the actor to an `EventThread` before dispatching to it.")
    )]
    NoAffinity {
        /// The actor that was dispatched to.
        id: ActorId,
    },
}
