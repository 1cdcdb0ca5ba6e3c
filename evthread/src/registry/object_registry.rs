// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! The process-wide `id → live actor` map. See [`ObjectRegistry`].

use crate::actor::ErasedActorCell;
use super::ActorId;
use std::collections::HashMap;
use std::sync::{OnceLock, RwLock, Weak};

/// Process-wide mapping from [`ActorId`] to a live actor cell, guarded by a
/// reader-writer lock.
///
/// # Invariant
///
/// An entry exists in the map **iff** the actor is currently attached to some thread.
/// [`insert()`] is called by attach and [`remove()`] by detach, both under the
/// exclusive lock; reference dispatch validates liveness with [`is_attached()`] under
/// the shared lock.
///
/// # Locking Contract
///
/// The shared lock is held only for the validation itself, never across an enqueue.
/// Queue insertion is instead revalidated against the owning thread's child-id set
/// under that thread's own locks (see `ThreadCore::enqueue()`), which is what makes a
/// registry hit that races with a concurrent detach harmless: the enqueue is rejected
/// at the thread, and closures already queued are purged by the detach. Keeping the
/// registry lock out of the enqueue path also keeps the global lock order acyclic
/// (child set, then handling, then queue; the registry lock is taken on its own).
///
/// # Why [`Weak`] Entries?
///
/// The map stores `Weak<dyn ErasedActorCell>` so that the registry never extends an
/// actor's lifetime: ownership stays with the [`ActorHandle`], and a cell that is
/// dropped (after forced detach) upgrades to [`None`] even if a stale entry were ever
/// observed mid-teardown.
///
/// [`ActorHandle`]: crate::ActorHandle
/// [`ThreadCore::enqueue()`]: crate::thread::ThreadCore::enqueue
/// [`insert()`]: Self::insert
/// [`is_attached()`]: Self::is_attached
/// [`remove()`]: Self::remove
#[derive(Debug, Default)]
pub struct ObjectRegistry {
    map: RwLock<HashMap<ActorId, Weak<dyn ErasedActorCell>>>,
}

/// Returns the singleton registry, creating it on first use.
pub(crate) fn global() -> &'static ObjectRegistry {
    static REGISTRY: OnceLock<ObjectRegistry> = OnceLock::new();
    REGISTRY.get_or_init(ObjectRegistry::default)
}

impl ObjectRegistry {
    /// Inserts `id` under the exclusive lock. Called by attach.
    pub(crate) fn insert(&self, id: ActorId, cell: Weak<dyn ErasedActorCell>) {
        if let Ok(mut map) = self.map.write() {
            map.insert(id, cell);
        }
    }

    /// Removes `id` under the exclusive lock. Called by detach.
    pub(crate) fn remove(&self, id: ActorId) {
        if let Ok(mut map) = self.map.write() {
            map.remove(&id);
        }
    }

    /// Checks liveness under the shared lock: `true` iff `id` is currently attached.
    pub(crate) fn is_attached(&self, id: ActorId) -> bool {
        self.map
            .read()
            .map(|map| map.contains_key(&id))
            .unwrap_or(false)
    }

    /// Resolves `id` to its cell under the shared lock, or [`None`] if detached.
    pub(crate) fn lookup(&self, id: ActorId) -> Option<Weak<dyn ErasedActorCell>> {
        self.map.read().ok()?.get(&id).cloned()
    }
}

/// Looks up a live actor by its stable identity, minting an [`UntypedActorRef`] for
/// it. Returns [`None`] when no actor with that id is currently attached.
///
/// This is the discovery path for code that holds only an id (wire messages, logs,
/// foreign registries); actors that already know each other exchange references
/// directly.
///
/// [`UntypedActorRef`]: crate::UntypedActorRef
#[must_use]
pub fn find(id: ActorId) -> Option<crate::actor::UntypedActorRef> {
    let cell = global().lookup(id)?;
    Some(crate::actor::UntypedActorRef::new(id, cell))
}
