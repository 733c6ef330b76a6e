//! leasepool Benchmarks
//!
//! Performance benchmarks for the leasepool library: the cost of a full
//! lease cycle through the in-memory pool, and the cost of the termination
//! race when many threads end the same lease at once.

#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![deny(clippy::nursery)]

use std::convert::Infallible;
use std::sync::atomic::{AtomicUsize, Ordering};

use leasepool::{PoolOptions, ResourceLocation};
use leasepool_memory::{Connector, InMemoryPool};

/// Connector that hands out sequence numbers and closes nothing.
#[derive(Debug, Default)]
pub struct CountingConnector {
    next: AtomicUsize,
}

impl Connector for CountingConnector {
    type Resource = usize;
    type Error = Infallible;

    fn open(&self, _location: &ResourceLocation) -> Result<Self::Resource, Self::Error> {
        Ok(self.next.fetch_add(1, Ordering::Relaxed))
    }

    fn close(&self, _resource: Self::Resource) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Builds an in-memory pool with default options for benchmarking.
///
/// # Panics
/// Panics if the fixed benchmark location or the default options are
/// rejected, which would be a bug.
pub fn bench_pool() -> InMemoryPool<CountingConnector> {
    InMemoryPool::new(
        ResourceLocation::try_new("bench:0").expect("benchmark location is valid"),
        CountingConnector::default(),
        PoolOptions::default(),
    )
    .expect("default pool options are valid")
}
