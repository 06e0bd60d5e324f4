//! # Cancellation flags for long-running requests
//!
//! A [`Closer`] is owned by whoever started an operation: a pending timer, a proxy channel, a
//! download. A [`Closable`] is a read-only view of the same flag handed to the party performing
//! the operation, so it can stop once the owner is no longer interested.
//!
//! Dropping a [`Closer`] closes it. Owners that keep a handle in an `Option` cancel it simply by
//! taking it out.

use std::sync::atomic::AtomicBool;
use std::sync::{atomic, Arc};

/// Owned closing state.
///
/// ```rust
/// use groundlink::core::utils::{Closable, Closer};
///
/// let closer = Closer::new();
/// let closable_1 = closer.to_closable();
/// let closable_2 = closable_1.clone();
///
/// assert!(!closable_1.is_closed());
///
/// drop(closer);
///
/// assert!(closable_1.is_closed());
/// assert!(closable_2.is_closed());
/// ```
#[derive(Debug)]
#[must_use]
pub struct Closer(Arc<AtomicBool>);

impl Closer {
    /// Creates an open closer.
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    /// Returns an instance of [`Closable`], a read-only accessor to the internal state.
    pub fn to_closable(&self) -> Closable {
        Closable(self.0.clone())
    }

    /// Closes the resource.
    pub fn close(&mut self) {
        self.0.store(true, atomic::Ordering::Release);
    }

    /// Returns `true` if resource is closed.
    pub fn is_closed(&self) -> bool {
        self.0.load(atomic::Ordering::Acquire)
    }
}

impl Default for Closer {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Closer {
    fn drop(&mut self) {
        self.close()
    }
}

/// Read-only access to a closing state.
///
/// Obtained by [`Closer::to_closable`].
#[derive(Clone, Debug)]
pub struct Closable(Arc<AtomicBool>);

impl Closable {
    /// Returns `true` if the owner has closed the resource or dropped it.
    pub fn is_closed(&self) -> bool {
        self.0.load(atomic::Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_close() {
        let mut closer = Closer::new();
        let closable = closer.to_closable();
        assert!(!closer.is_closed());

        closer.close();
        assert!(closer.is_closed());
        assert!(closable.is_closed());
    }

    #[test]
    fn close_on_take() {
        let mut slot = Some(Closer::new());
        let closable = slot.as_ref().unwrap().to_closable();

        slot.take();
        assert!(closable.is_closed());
    }
}
