// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! The internal cell that ties an actor's body, id, and affinity together. See
//! [`ActorCell`].

use super::Actor;
use crate::registry::{self, ActorId};
use crate::thread::core::{lock, ThreadCore};
use crate::thread::EventThread;
use std::sync::{Arc, Mutex, Weak};

/// Shared state of one actor: its stable id, the user value, and the thread it is
/// currently attached to.
///
/// Ownership: exactly one [`ActorHandle`] owns the strong [`Arc`]; queued closures
/// hold temporary strong clones so a body is never freed out from under an in-flight
/// invocation; the registry and all references hold [`Weak`]s. The cell keeps a
/// [`Weak`] to itself (via [`Arc::new_cyclic`]) so `&self` methods can mint those
/// clones.
///
/// The body mutex is never contended in steady state - only closures draining on the
/// affinity thread lock it - but it makes cross-thread attach/detach hooks and
/// forced teardown sound without any unsafe code.
///
/// [`ActorHandle`]: super::ActorHandle
pub(crate) struct ActorCell<A: Actor> {
    id: ActorId,
    body: Mutex<A>,
    affinity: Mutex<Option<Arc<ThreadCore>>>,
    self_weak: Weak<ActorCell<A>>,
}

/// Type-erased view of an [`ActorCell`], stored in the registry and inside
/// [`UntypedActorRef`]s.
///
/// [`UntypedActorRef`]: super::UntypedActorRef
pub(crate) trait ErasedActorCell: Send + Sync {
    /// The thread this actor is currently attached to, if any.
    fn affinity(&self) -> Option<Arc<ThreadCore>>;
}

impl<A: Actor> ActorCell<A> {
    pub(crate) fn new(actor: A) -> Arc<Self> {
        Arc::new_cyclic(|self_weak| Self {
            id: ActorId::next(),
            body: Mutex::new(actor),
            affinity: Mutex::new(None),
            self_weak: Weak::clone(self_weak),
        })
    }

    pub(crate) fn actor_id(&self) -> ActorId { self.id }

    pub(crate) fn is_attached(&self) -> bool {
        lock(&self.affinity).is_some()
    }

    pub(crate) fn weak_erased(&self) -> Weak<dyn ErasedActorCell> {
        let erased: Weak<dyn ErasedActorCell> = self.self_weak.clone();
        erased
    }

    /// Binds this actor to `thread`, detaching from the current thread first (a
    /// re-attach is detach-then-attach; queued closures on the old thread are purged,
    /// not moved). Runs the [`Actor::on_attach()`] hook last.
    pub(crate) fn attach(&self, thread: &EventThread) {
        self.detach();

        let core = Arc::clone(thread.core());
        *lock(&self.affinity) = Some(Arc::clone(&core));
        core.adopt_child(self.id);
        registry::global().insert(self.id, self.weak_erased());
        tracing::debug!(id = %self.id, thread = %core.name(), "actor attached");

        if let Ok(mut body) = self.body.lock() {
            body.on_attach(thread);
        }
    }

    /// Unbinds this actor: removes it from its thread's child set, purges its queued
    /// closures, and erases it from the registry. Runs [`Actor::on_detach()`] last.
    /// Returns whether the actor was attached.
    pub(crate) fn detach(&self) -> bool {
        let taken = lock(&self.affinity).take();
        let Some(core) = taken else {
            return false;
        };
        core.detach_actor(self.id);

        if let Ok(mut body) = self.body.lock() {
            body.on_detach();
        }
        true
    }

    /// Queues `f` for execution on the affinity thread, under this actor's id.
    /// Returns `false` when unattached, already detached at the thread, or dropped by
    /// the queue bound.
    pub(crate) fn try_enqueue(&self, f: impl FnOnce(&mut A) + Send + 'static) -> bool {
        let Some(core) = self.affinity() else {
            return false;
        };
        let Some(cell) = self.self_weak.upgrade() else {
            return false;
        };
        core.enqueue(
            self.id,
            Box::new(move || {
                // A poisoned body means an earlier invocation panicked; skip quietly
                // rather than poison-cascade across unrelated closures.
                if let Ok(mut body) = cell.body.lock() {
                    f(&mut body);
                }
            }),
        )
    }
}

impl<A: Actor> ErasedActorCell for ActorCell<A> {
    fn affinity(&self) -> Option<Arc<ThreadCore>> {
        lock(&self.affinity).clone()
    }
}
