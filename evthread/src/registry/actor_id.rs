// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Process-wide unique actor identity. See [`ActorId`].

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counter backing [`ActorId::next()`]. Starts at 1 so id `0` never occurs in logs and
/// can't be confused with a zero-initialized value from foreign code.
static NEXT_ACTOR_ID: AtomicU64 = AtomicU64::new(1);

/// A stable identity for one actor, assigned at construction and never reused.
///
/// The id is the key under which the actor is discoverable in the
/// [`ObjectRegistry`] while attached, and the owner tag on every closure it
/// enqueues. References ([`ActorRef`], [`UntypedActorRef`]) resolve by id, which is
/// what keeps them valid across re-attach to a different thread.
///
/// [`ActorRef`]: crate::ActorRef
/// [`ObjectRegistry`]: super::ObjectRegistry
/// [`UntypedActorRef`]: crate::UntypedActorRef
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActorId(u64);

impl ActorId {
    /// Allocates the next id from the process-wide counter.
    pub(crate) fn next() -> Self {
        Self(NEXT_ACTOR_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// The raw numeric value, for logging and diagnostics.
    #[must_use]
    pub fn as_u64(&self) -> u64 { self.0 }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "actor#{}", self.0)
    }
}
