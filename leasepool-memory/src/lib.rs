//! In-memory resource pool for `leasepool`
//!
//! This crate provides a small [`ResourcePool`] implementation that keeps
//! healthy resources in a LIFO idle list and opens new ones through a
//! [`Connector`] when the list is empty. It is meant for tests, examples and
//! development setups; its placement policy is intentionally simple.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};

use leasepool::{ConfigError, HandleId, ManagedHandle, PoolOptions, ResourceLocation, ResourcePool};
use parking_lot::Mutex;
use thiserror::Error;

/// Opens and closes the physical resources behind a pool.
pub trait Connector: Send + Sync {
    /// The resource handed out in leases. Handles keep their own copy for
    /// the length of a lease, so this is usually an `Arc` around the real
    /// connection.
    type Resource: Clone;

    /// Connector-specific failure.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Establishes a new resource at `location`.
    fn open(&self, location: &ResourceLocation) -> Result<Self::Resource, Self::Error>;

    /// Disposes of a resource. Called for discarded resources and for healthy
    /// ones the idle list has no room for.
    fn close(&self, resource: Self::Resource) -> Result<(), Self::Error>;
}

/// Errors raised by [`InMemoryPool`].
#[derive(Debug, Error)]
pub enum MemoryPoolError<E>
where
    E: std::error::Error + 'static,
{
    /// All permitted leases are outstanding.
    #[error("pool for '{location}' is exhausted ({max_active} leases outstanding)")]
    Exhausted {
        /// Pool location
        location: ResourceLocation,
        /// Configured lease limit
        max_active: usize,
    },

    /// The connector failed to open a new resource.
    #[error("failed to open resource at '{location}': {source}")]
    Open {
        /// Pool location
        location: ResourceLocation,
        /// Connector error
        #[source]
        source: E,
    },

    /// The connector failed to close a resource.
    #[error("failed to close resource at '{location}': {source}")]
    Close {
        /// Pool location
        location: ResourceLocation,
        /// Connector error
        #[source]
        source: E,
    },

    /// A handle was passed to `reclaim`/`destroy` directly, before it was
    /// released or discarded.
    #[error("handle for '{location}' is still active")]
    StillActive {
        /// Location of the returned handle
        location: ResourceLocation,
    },

    /// A handle issued by a different pool was returned here.
    #[error("handle for '{location}' was not issued by this pool")]
    ForeignHandle {
        /// Location of the returned handle
        location: ResourceLocation,
    },

    /// The pool already took this handle's resource back.
    #[error("handle {handle_id} for '{location}' was already returned")]
    AlreadyReturned {
        /// Lease that was returned twice
        handle_id: HandleId,
        /// Location of the returned handle
        location: ResourceLocation,
    },
}

/// Point-in-time counters for an [`InMemoryPool`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Leases currently outstanding
    pub active: usize,
    /// Healthy resources waiting for reuse
    pub idle: usize,
    /// Resources opened through the connector
    pub opened: u64,
    /// Resources closed through the connector
    pub closed: u64,
    /// Leases ended with `release`
    pub reclaimed: u64,
    /// Leases ended with `discard`
    pub destroyed: u64,
}

#[derive(Debug)]
struct Inventory<R> {
    idle: Vec<R>,
    active: usize,
    outstanding: HashSet<HandleId>,
}

#[derive(Debug, Default)]
struct Counters {
    opened: AtomicU64,
    closed: AtomicU64,
    reclaimed: AtomicU64,
    destroyed: AtomicU64,
}

/// A pool of resources at a single location, held in memory.
pub struct InMemoryPool<C>
where
    C: Connector,
{
    location: ResourceLocation,
    connector: C,
    options: PoolOptions,
    inventory: Mutex<Inventory<C::Resource>>,
    counters: Counters,
}

impl<C> InMemoryPool<C>
where
    C: Connector,
{
    /// Creates an empty pool. Resources are opened lazily by [`get`](Self::get).
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidValue`] when `options` fail
    /// [`PoolOptions::validate`].
    pub fn new(
        location: ResourceLocation,
        connector: C,
        options: PoolOptions,
    ) -> Result<Self, ConfigError> {
        let options = options.validate()?;

        Ok(Self {
            location,
            connector,
            options,
            inventory: Mutex::new(Inventory {
                idle: Vec::new(),
                active: 0,
                outstanding: HashSet::new(),
            }),
            counters: Counters::default(),
        })
    }

    /// Location this pool serves.
    pub const fn location(&self) -> &ResourceLocation {
        &self.location
    }

    /// Options the pool was built with.
    pub const fn options(&self) -> &PoolOptions {
        &self.options
    }

    /// The connector used to open and close resources.
    pub const fn connector(&self) -> &C {
        &self.connector
    }

    /// Leases a resource, reusing the most recently returned idle one if
    /// there is any.
    pub fn get(
        &self,
    ) -> Result<ManagedHandle<'_, C::Resource, Self>, MemoryPoolError<C::Error>> {
        let max_active: usize = self.options.max_active_handles.into();

        let reused = {
            let mut inventory = self.inventory.lock();
            if inventory.active >= max_active {
                tracing::debug!(location = %self.location, max_active, "pool exhausted");
                return Err(MemoryPoolError::Exhausted {
                    location: self.location.clone(),
                    max_active,
                });
            }
            inventory.active += 1;
            inventory.idle.pop()
        };

        let resource = match reused {
            Some(resource) => resource,
            None => match self.connector.open(&self.location) {
                Ok(resource) => {
                    self.counters.opened.fetch_add(1, Ordering::Relaxed);
                    tracing::debug!(location = %self.location, "opened new resource");
                    resource
                }
                Err(source) => {
                    self.inventory.lock().active -= 1;
                    return Err(MemoryPoolError::Open {
                        location: self.location.clone(),
                        source,
                    });
                }
            },
        };

        let handle = ManagedHandle::new(
            self.location.clone(),
            resource,
            self,
            self.options.handle,
        );
        self.inventory.lock().outstanding.insert(handle.id());
        Ok(handle)
    }

    /// Current counters.
    pub fn stats(&self) -> PoolStats {
        let (active, idle) = {
            let inventory = self.inventory.lock();
            (inventory.active, inventory.idle.len())
        };

        PoolStats {
            active,
            idle,
            opened: self.counters.opened.load(Ordering::Relaxed),
            closed: self.counters.closed.load(Ordering::Relaxed),
            reclaimed: self.counters.reclaimed.load(Ordering::Relaxed),
            destroyed: self.counters.destroyed.load(Ordering::Relaxed),
        }
    }

    /// Closes every idle resource and returns how many were closed.
    ///
    /// All idle resources are removed even if some fail to close; the first
    /// failure is reported.
    pub fn close_idle(&self) -> Result<usize, MemoryPoolError<C::Error>> {
        let idle = std::mem::take(&mut self.inventory.lock().idle);
        let count = idle.len();

        let mut first_error = None;
        for resource in idle {
            if let Err(error) = self.close(resource) {
                first_error.get_or_insert(error);
            }
        }

        first_error.map_or(Ok(count), Err)
    }

    fn close(&self, resource: C::Resource) -> Result<(), MemoryPoolError<C::Error>> {
        self.counters.closed.fetch_add(1, Ordering::Relaxed);
        self.connector.close(resource).map_err(|source| {
            tracing::warn!(
                location = %self.location,
                error = %source,
                "failed to close resource"
            );
            MemoryPoolError::Close {
                location: self.location.clone(),
                source,
            }
        })
    }

    /// Checks that `handle` is a terminated lease of this pool that has not
    /// been taken back yet, and frees its lease slot.
    fn take_back(
        &self,
        handle: &ManagedHandle<'_, C::Resource, Self>,
    ) -> Result<C::Resource, MemoryPoolError<C::Error>> {
        if !std::ptr::eq(handle.owner(), self) {
            return Err(MemoryPoolError::ForeignHandle {
                location: handle.location().clone(),
            });
        }
        let resource = handle
            .returned_resource()
            .cloned()
            .ok_or_else(|| MemoryPoolError::StillActive {
                location: handle.location().clone(),
            })?;

        let was_outstanding = {
            let mut inventory = self.inventory.lock();
            let was_outstanding = inventory.outstanding.remove(&handle.id());
            if was_outstanding {
                inventory.active -= 1;
            }
            was_outstanding
        };

        if !was_outstanding {
            tracing::warn!(
                handle_id = %handle.id(),
                location = %handle.location(),
                "rejected duplicate return"
            );
            return Err(MemoryPoolError::AlreadyReturned {
                handle_id: handle.id(),
                location: handle.location().clone(),
            });
        }
        Ok(resource)
    }
}

impl<C> ResourcePool for InMemoryPool<C>
where
    C: Connector,
{
    type Resource = C::Resource;
    type Error = MemoryPoolError<C::Error>;

    fn reclaim(&self, handle: &ManagedHandle<'_, C::Resource, Self>) -> Result<(), Self::Error> {
        let resource = self.take_back(handle)?;
        self.counters.reclaimed.fetch_add(1, Ordering::Relaxed);
        let max_idle: usize = self.options.max_idle_handles.into();

        let overflow = {
            let mut inventory = self.inventory.lock();
            if inventory.idle.len() < max_idle {
                inventory.idle.push(resource);
                None
            } else {
                Some(resource)
            }
        };

        match overflow {
            Some(resource) => {
                tracing::debug!(
                    handle_id = %handle.id(),
                    "idle list full, closing reclaimed resource"
                );
                self.close(resource)
            }
            None => Ok(()),
        }
    }

    fn destroy(&self, handle: &ManagedHandle<'_, C::Resource, Self>) -> Result<(), Self::Error> {
        let resource = self.take_back(handle)?;
        self.counters.destroyed.fetch_add(1, Ordering::Relaxed);

        tracing::debug!(handle_id = %handle.id(), "destroying discarded resource");
        self.close(resource)
    }
}
