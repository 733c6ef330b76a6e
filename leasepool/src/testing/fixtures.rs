//! Test doubles for the pool side of a lease.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use thiserror::Error;

use crate::config::HandleOptions;
use crate::handle::{ManagedHandle, Termination};
use crate::pool::ResourcePool;
use crate::types::{HandleId, ResourceLocation};

/// Error produced by an armed [`RecordingPool`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct RecordedPoolError(pub String);

/// One `reclaim` or `destroy` call observed by a [`RecordingPool`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReturnCall {
    /// Handle that was returned
    pub handle_id: HandleId,
    /// Its location
    pub location: ResourceLocation,
    /// `Released` for `reclaim`, `Discarded` for `destroy`
    pub termination: Termination,
    /// Whether the handle still reported itself active during the call
    pub was_active: bool,
}

/// A pool that records every return instead of managing resources.
///
/// Useful for asserting the exactly-once contract: each handle issued from
/// this pool should show up in [`calls`](Self::calls) once and only once.
#[derive(Debug)]
pub struct RecordingPool<R> {
    calls: Mutex<Vec<ReturnCall>>,
    reclaims: AtomicUsize,
    destroys: AtomicUsize,
    reclaim_failure: Mutex<Option<String>>,
    destroy_failure: Mutex<Option<String>>,
    return_delay: Option<Duration>,
    handle_options: HandleOptions,
    _resource: std::marker::PhantomData<fn() -> R>,
}

impl<R> RecordingPool<R> {
    /// Creates a pool that accepts every return.
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            reclaims: AtomicUsize::new(0),
            destroys: AtomicUsize::new(0),
            reclaim_failure: Mutex::new(None),
            destroy_failure: Mutex::new(None),
            return_delay: None,
            handle_options: HandleOptions::default(),
            _resource: std::marker::PhantomData,
        }
    }

    /// Makes every return block for `delay` before completing.
    #[must_use]
    pub fn with_return_delay(mut self, delay: Duration) -> Self {
        self.return_delay = Some(delay);
        self
    }

    /// Options passed to handles issued by [`lease`](Self::lease).
    #[must_use]
    pub fn with_handle_options(mut self, options: HandleOptions) -> Self {
        self.handle_options = options;
        self
    }

    /// Issues a handle for `resource` at `location`.
    ///
    /// # Panics
    /// Panics if `location` is not a valid [`ResourceLocation`].
    pub fn lease(&self, location: &str, resource: R) -> ManagedHandle<'_, R, Self> {
        let location = ResourceLocation::try_new(location).expect("test location should be valid");
        ManagedHandle::new(location, resource, self, self.handle_options)
    }

    /// Makes subsequent `reclaim` calls fail with `message`.
    pub fn fail_reclaim_with(&self, message: &str) {
        *self.reclaim_failure.lock() = Some(message.to_string());
    }

    /// Makes subsequent `destroy` calls fail with `message`.
    pub fn fail_destroy_with(&self, message: &str) {
        *self.destroy_failure.lock() = Some(message.to_string());
    }

    /// Number of `reclaim` calls received.
    pub fn reclaim_calls(&self) -> usize {
        self.reclaims.load(Ordering::SeqCst)
    }

    /// Number of `destroy` calls received.
    pub fn destroy_calls(&self) -> usize {
        self.destroys.load(Ordering::SeqCst)
    }

    /// Number of returns of either kind.
    pub fn total_calls(&self) -> usize {
        self.reclaim_calls() + self.destroy_calls()
    }

    /// Every return received, in arrival order.
    pub fn calls(&self) -> Vec<ReturnCall> {
        self.calls.lock().clone()
    }

    /// Returns received for one handle.
    pub fn calls_for(&self, handle_id: HandleId) -> Vec<ReturnCall> {
        self.calls
            .lock()
            .iter()
            .filter(|call| call.handle_id == handle_id)
            .cloned()
            .collect()
    }

    fn record(
        &self,
        handle: &ManagedHandle<'_, R, Self>,
        termination: Termination,
        failure: &Mutex<Option<String>>,
    ) -> Result<(), RecordedPoolError> {
        if let Some(delay) = self.return_delay {
            std::thread::sleep(delay);
        }

        self.calls.lock().push(ReturnCall {
            handle_id: handle.id(),
            location: handle.location().clone(),
            termination,
            was_active: handle.is_active(),
        });

        let counter = match termination {
            Termination::Released => &self.reclaims,
            Termination::Discarded => &self.destroys,
        };
        counter.fetch_add(1, Ordering::SeqCst);

        failure.lock().clone().map_or(Ok(()), |message| Err(RecordedPoolError(message)))
    }
}

impl<R> Default for RecordingPool<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> ResourcePool for RecordingPool<R> {
    type Resource = R;
    type Error = RecordedPoolError;

    fn reclaim(&self, handle: &ManagedHandle<'_, R, Self>) -> Result<(), Self::Error> {
        self.record(handle, Termination::Released, &self.reclaim_failure)
    }

    fn destroy(&self, handle: &ManagedHandle<'_, R, Self>) -> Result<(), Self::Error> {
        self.record(handle, Termination::Discarded, &self.destroy_failure)
    }
}
