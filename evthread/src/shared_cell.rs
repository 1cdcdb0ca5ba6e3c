// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! A read/write-locked shared value. See [`SharedCell`].

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

/// A clonable cell for the rare state that actors share directly instead of
/// message-passing.
///
/// Reads take the shared lock, writes the exclusive lock; both run a closure so the
/// guard can never escape the critical section. Keep the closures small - everything
/// inside runs under the lock. The runtime itself never hands these out; actors are
/// encouraged to communicate by queued calls and reach for a `SharedCell` only when
/// a value genuinely must be read from many threads.
///
/// # Example
///
/// ```
/// use evthread::SharedCell;
///
/// let cell = SharedCell::new(vec![1, 2, 3]);
/// let clone = cell.clone(); // same underlying value
/// clone.write(|v| v.push(4));
/// assert_eq!(cell.read(Vec::len), 4);
/// ```
pub struct SharedCell<T> {
    inner: Arc<RwLock<T>>,
}

impl<T> SharedCell<T> {
    #[must_use]
    pub fn new(value: T) -> Self {
        Self { inner: Arc::new(RwLock::new(value)) }
    }

    /// Runs `f` with shared (read) access.
    pub fn read<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        f(&guard)
    }

    /// Runs `f` with exclusive (write) access.
    pub fn write<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }
}

// Manual impl: cloning shares the value, so `T: Clone` is not required.
impl<T> Clone for SharedCell<T> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<T> fmt::Debug for SharedCell<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedCell").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn clones_share_the_value() {
        let cell = SharedCell::new(0_u64);
        let clone = cell.clone();
        clone.write(|n| *n = 7);
        assert_eq!(cell.read(|n| *n), 7);
    }

    #[test]
    fn concurrent_writes_all_land() {
        let cell = SharedCell::new(0_u64);
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cell = cell.clone();
                thread::spawn(move || {
                    for _ in 0..100 {
                        cell.write(|n| *n += 1);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(cell.read(|n| *n), 800);
    }
}
