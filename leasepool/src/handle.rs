//! Leased handles over pooled resources.
//!
//! A [`ManagedHandle`] wraps one physical resource issued by a
//! [`ResourcePool`]. It can be terminated exactly once, either by
//! [`release`](ManagedHandle::release) (the resource is healthy and goes back
//! to the pool) or by [`discard`](ManagedHandle::discard) (the resource is
//! broken and must be destroyed). Both paths race on a single atomic
//! compare-and-set; only the winner talks to the pool, every other attempt is
//! a silent no-op.
//!
//! ```rust,ignore
//! let handle = pool.get()?;
//! let conn = handle.access()?;
//! match conn.ping() {
//!     Ok(()) => handle.release()?,
//!     Err(_) => handle.discard()?,
//! }
//! ```

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::config::HandleOptions;
use crate::errors::{HandleInvalid, PoolError, PoolResult};
use crate::pool::ResourcePool;
use crate::types::{HandleId, ResourceLocation, Timestamp};

const ACTIVE: u8 = 0;
const RELEASED: u8 = 1;
const DISCARDED: u8 = 2;

/// How a lease ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// Returned healthy; the pool reclaims the resource.
    Released,
    /// Returned broken; the pool destroys the resource.
    Discarded,
}

impl Termination {
    const fn as_raw(self) -> u8 {
        match self {
            Self::Released => RELEASED,
            Self::Discarded => DISCARDED,
        }
    }
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Released => f.write_str("released"),
            Self::Discarded => f.write_str("discarded"),
        }
    }
}

/// Lifecycle state of a handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LeaseState {
    /// The lease is held and the resource may be used.
    Active,
    /// The lease has ended; the resource belongs to the pool again.
    Terminated(Termination),
}

impl LeaseState {
    const fn from_raw(raw: u8) -> Self {
        match raw {
            ACTIVE => Self::Active,
            RELEASED => Self::Terminated(Termination::Released),
            _ => Self::Terminated(Termination::Discarded),
        }
    }
}

/// A resource leased from a [`ResourcePool`].
///
/// The handle borrows its pool for the whole lease, so the pool always
/// outlives the handles it issued. `location`, `resource` and `owner` are
/// fixed at construction; the lifecycle state is the only field that changes,
/// and it changes exactly once.
///
/// Handles may be shared between threads (`&ManagedHandle`, scoped threads,
/// `Arc`). Concurrent termination is safe. Concurrent *use* of the resource
/// is not synchronized here and is up to the caller.
///
/// Dropping a handle that is still active does not return it; the pool never
/// hears about the lease again and an error is logged.
pub struct ManagedHandle<'p, R, P: ?Sized> {
    id: HandleId,
    location: ResourceLocation,
    resource: R,
    owner: &'p P,
    state: AtomicU8,
    leased_at: Timestamp,
    started: Instant,
    slow_return_threshold: Duration,
}

impl<'p, R, P> ManagedHandle<'p, R, P>
where
    P: ResourcePool<Resource = R> + ?Sized,
{
    /// Wraps `resource` in an active handle owned by `owner`.
    ///
    /// Called by pool implementations when they hand out a lease. Everything
    /// the handle needs from `options` is copied here.
    pub fn new(
        location: ResourceLocation,
        resource: R,
        owner: &'p P,
        options: HandleOptions,
    ) -> Self {
        let id = HandleId::new();
        tracing::debug!(handle_id = %id, location = %location, "lease issued");

        Self {
            id,
            location,
            resource,
            owner,
            state: AtomicU8::new(ACTIVE),
            leased_at: Timestamp::now(),
            started: Instant::now(),
            slow_return_threshold: options.slow_return_threshold.as_duration(),
        }
    }

    /// Unique identifier of this lease.
    pub const fn id(&self) -> HandleId {
        self.id
    }

    /// Where the underlying resource lives.
    pub const fn location(&self) -> &ResourceLocation {
        &self.location
    }

    /// The pool that issued this handle.
    pub const fn owner(&self) -> &'p P {
        self.owner
    }

    /// Wall-clock time at which the lease was issued.
    pub const fn leased_at(&self) -> Timestamp {
        self.leased_at
    }

    /// Time elapsed since the lease was issued.
    pub fn lease_duration(&self) -> Duration {
        self.started.elapsed()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> LeaseState {
        LeaseState::from_raw(self.state.load(Ordering::Acquire))
    }

    /// Whether the lease is still held.
    pub fn is_active(&self) -> bool {
        self.state.load(Ordering::Acquire) == ACTIVE
    }

    /// The terminal path that ended the lease, if it has ended.
    pub fn termination(&self) -> Option<Termination> {
        match self.state() {
            LeaseState::Active => None,
            LeaseState::Terminated(termination) => Some(termination),
        }
    }

    /// Returns the leased resource.
    ///
    /// Fails with [`HandleInvalid`] on every call once the handle has been
    /// released or discarded; [`returned_resource`](Self::returned_resource)
    /// still exposes the stale resource for diagnostics.
    pub fn access(&self) -> Result<&R, HandleInvalid> {
        match self.state() {
            LeaseState::Active => Ok(&self.resource),
            LeaseState::Terminated(termination) => {
                Err(HandleInvalid::new(self.location.clone(), termination))
            }
        }
    }

    /// The resource being handed back, for use by the owning pool inside
    /// [`ResourcePool::reclaim`] and [`ResourcePool::destroy`], or by a caller
    /// inspecting a terminated handle.
    ///
    /// Returns `None` while the lease is active.
    pub fn returned_resource(&self) -> Option<&R> {
        if self.is_active() {
            None
        } else {
            Some(&self.resource)
        }
    }

    /// Returns the resource to the pool as healthy.
    ///
    /// Only the first terminal call on a handle reaches the pool; later calls,
    /// including a `release` after `discard`, return `Ok(())` and do nothing.
    /// A pool failure is returned to the caller but the handle stays
    /// terminated.
    pub fn release(&self) -> PoolResult<P::Error> {
        self.terminate(Termination::Released)
    }

    /// Returns the resource to the pool as broken so it gets destroyed.
    ///
    /// Same exactly-once rules as [`release`](Self::release).
    pub fn discard(&self) -> PoolResult<P::Error> {
        self.terminate(Termination::Discarded)
    }

    fn try_transition(&self, termination: Termination) -> bool {
        self.state
            .compare_exchange(ACTIVE, termination.as_raw(), Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    fn terminate(&self, termination: Termination) -> PoolResult<P::Error> {
        if !self.try_transition(termination) {
            tracing::trace!(
                handle_id = %self.id,
                location = %self.location,
                requested = %termination,
                "lease already terminated, ignoring"
            );
            return Ok(());
        }

        tracing::debug!(
            handle_id = %self.id,
            location = %self.location,
            termination = %termination,
            held_ms = duration_ms(self.lease_duration()),
            "lease terminated"
        );

        let forwarded_at = Instant::now();
        let outcome = match termination {
            Termination::Released => {
                self.owner
                    .reclaim(self)
                    .map_err(|source| PoolError::ReclaimFailed {
                        location: self.location.clone(),
                        source,
                    })
            }
            Termination::Discarded => {
                self.owner
                    .destroy(self)
                    .map_err(|source| PoolError::DestroyFailed {
                        location: self.location.clone(),
                        source,
                    })
            }
        };

        let elapsed = forwarded_at.elapsed();
        if elapsed > self.slow_return_threshold {
            tracing::warn!(
                handle_id = %self.id,
                location = %self.location,
                termination = %termination,
                elapsed_ms = duration_ms(elapsed),
                "pool was slow to accept returned resource"
            );
        }

        if let Err(error) = &outcome {
            tracing::warn!(
                handle_id = %self.id,
                location = %self.location,
                error = %error,
                "pool failed to process returned resource"
            );
        }

        outcome
    }
}

impl<R, P> fmt::Debug for ManagedHandle<'_, R, P>
where
    P: ResourcePool<Resource = R> + ?Sized,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManagedHandle")
            .field("id", &self.id)
            .field("location", &self.location)
            .field("state", &self.state())
            .field("leased_at", &self.leased_at)
            .finish_non_exhaustive()
    }
}

impl<R, P: ?Sized> Drop for ManagedHandle<'_, R, P> {
    fn drop(&mut self) {
        if *self.state.get_mut() == ACTIVE {
            tracing::error!(
                handle_id = %self.id,
                location = %self.location,
                held_ms = duration_ms(self.started.elapsed()),
                "lease dropped without release or discard - resource leaked from pool"
            );
        }
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
