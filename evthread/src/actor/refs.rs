// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Liveness-safe actor references. See [`ActorRef`] and [`UntypedActorRef`].

use super::{Actor, ActorCell, ErasedActorCell};
use crate::registry::{self, ActorId};
use std::fmt;
use std::sync::Weak;

/// A typed, liveness-safe handle to an actor, held by other actors (and timers and
/// promise chains) to dispatch to it.
///
/// Carries the actor's [`ActorId`] plus a [`Weak`] cell pointer. The pointer is only
/// a fast path: every dispatch first validates liveness by id through the registry
/// under its shared lock, then enqueues under the owning thread's own locks. A
/// dispatch to a detached or dropped target returns `false` and does nothing.
///
/// References stay valid across re-attach to a different thread because they resolve
/// by id, not by thread.
pub struct ActorRef<A: Actor> {
    id: ActorId,
    cell: Weak<ActorCell<A>>,
}

impl<A: Actor> ActorRef<A> {
    pub(crate) fn new(id: ActorId, cell: Weak<ActorCell<A>>) -> Self {
        Self { id, cell }
    }

    #[must_use]
    pub fn id(&self) -> ActorId { self.id }

    /// Whether the target is currently attached (and therefore reachable).
    #[must_use]
    pub fn alive(&self) -> bool {
        registry::global().is_attached(self.id)
    }

    /// Queues `method(&mut actor, arg)` on the target's thread. Returns `false`
    /// (dispatching nothing) when the target has been detached or dropped.
    pub fn call<P>(&self, method: fn(&mut A, P), arg: P) -> bool
    where
        P: Send + 'static,
    {
        self.run(move |actor| method(actor, arg))
    }

    /// Erases the actor type: same id, same liveness contract, closure-only
    /// dispatch.
    #[must_use]
    pub fn untyped(&self) -> UntypedActorRef {
        let erased: Weak<dyn ErasedActorCell> = self.cell.clone();
        UntypedActorRef::new(self.id, erased)
    }

    /// Queues an arbitrary closure over the actor on the target's thread. Returns
    /// `false` when the target has been detached or dropped.
    pub fn run(&self, f: impl FnOnce(&mut A) + Send + 'static) -> bool {
        if !self.alive() {
            return false;
        }
        let Some(cell) = self.cell.upgrade() else {
            return false;
        };
        cell.try_enqueue(f)
    }
}

// Manual impl: a ref is clonable regardless of whether `A` is.
impl<A: Actor> Clone for ActorRef<A> {
    fn clone(&self) -> Self {
        Self { id: self.id, cell: Weak::clone(&self.cell) }
    }
}

impl<A: Actor> fmt::Debug for ActorRef<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActorRef").field("id", &self.id).finish_non_exhaustive()
    }
}

/// An untyped, liveness-safe handle to an actor.
///
/// Same contract as [`ActorRef`], with the actor's type erased: dispatch takes a
/// plain closure that runs on the target's thread under the target's id (so it is
/// purged if the target detaches first), without access to the actor value.
#[derive(Clone)]
pub struct UntypedActorRef {
    id: ActorId,
    cell: Weak<dyn ErasedActorCell>,
}

impl UntypedActorRef {
    pub(crate) fn new(id: ActorId, cell: Weak<dyn ErasedActorCell>) -> Self {
        Self { id, cell }
    }

    #[must_use]
    pub fn id(&self) -> ActorId { self.id }

    /// Whether the target is currently attached (and therefore reachable).
    #[must_use]
    pub fn alive(&self) -> bool {
        registry::global().is_attached(self.id)
    }

    /// Queues `f` on the target's thread under the target's id. Returns `false` when
    /// the target has been detached or dropped.
    pub fn run(&self, f: impl FnOnce() + Send + 'static) -> bool {
        if !self.alive() {
            return false;
        }
        let Some(cell) = self.cell.upgrade() else {
            return false;
        };
        let Some(core) = cell.affinity() else {
            return false;
        };
        core.enqueue(self.id, Box::new(f))
    }
}

impl fmt::Debug for UntypedActorRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UntypedActorRef").field("id", &self.id).finish_non_exhaustive()
    }
}
