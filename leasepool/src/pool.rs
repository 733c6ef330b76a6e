//! The pool side of a lease.
//!
//! A pool hands out [`ManagedHandle`]s and gets each of them back exactly
//! once, through either [`ResourcePool::reclaim`] or
//! [`ResourcePool::destroy`]. How the pool stores, reuses or replaces its
//! resources is its own business.

use crate::handle::ManagedHandle;

/// A pool that issues [`ManagedHandle`]s and takes them back.
///
/// The handle guarantees that for every handle it issued, the pool sees
/// exactly one call to either `reclaim` or `destroy`, never both, even when
/// several threads race to terminate the same handle. Implementations can
/// therefore update free lists and counters without guarding against
/// duplicate returns.
///
/// Both methods run on the thread that won the termination race and may
/// block; they are never called while the handle is still active.
pub trait ResourcePool {
    /// The pooled resource type.
    type Resource;

    /// Pool-defined failure, returned verbatim to the caller of
    /// `release`/`discard` inside a [`PoolError`](crate::errors::PoolError).
    type Error: std::error::Error + Send + Sync + 'static;

    /// Takes a healthy resource back into the reusable inventory.
    fn reclaim(&self, handle: &ManagedHandle<'_, Self::Resource, Self>) -> Result<(), Self::Error>;

    /// Permanently disposes of a broken resource. It must not be handed out
    /// again.
    fn destroy(&self, handle: &ManagedHandle<'_, Self::Resource, Self>) -> Result<(), Self::Error>;
}
