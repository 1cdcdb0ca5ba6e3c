// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Stable actor identities and the process-wide object registry.
//!
//! Every actor gets an [`ActorId`] at construction from a monotonically increasing
//! process-wide counter; ids are never reused. The [registry] maps each id to a live
//! actor cell **iff** that actor is currently attached to a thread, so any holder of an
//! id can check liveness without touching a raw pointer. See [`ObjectRegistry`] for the
//! locking contract.
//!
//! [registry]: ObjectRegistry

mod actor_id;
mod object_registry;

pub use actor_id::*;
pub use object_registry::*;
