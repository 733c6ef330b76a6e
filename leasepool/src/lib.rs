//! `leasepool` - exactly-once leased handles over pooled resources
//!
//! A pool lends out a resource (a connection, a file descriptor, a session
//! token) wrapped in a [`ManagedHandle`]. The consumer uses the resource and
//! then ends the lease with either [`ManagedHandle::release`] (healthy) or
//! [`ManagedHandle::discard`] (broken). Whatever mix of those calls happens,
//! from however many threads, the owning [`ResourcePool`] sees exactly one
//! `reclaim` or `destroy` for that handle.
//!
//! ```rust,ignore
//! use leasepool::{ManagedHandle, ResourcePool};
//!
//! fn run_query<P>(handle: &ManagedHandle<'_, Conn, P>) -> anyhow::Result<()>
//! where
//!     P: ResourcePool<Resource = Conn>,
//! {
//!     let conn = handle.access()?;
//!     if let Err(error) = conn.query("SELECT 1") {
//!         handle.discard()?;
//!         return Err(error.into());
//!     }
//!     handle.release()?;
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod errors;
pub mod handle;
pub mod pool;
pub mod types;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use config::{HandleOptions, PoolOptions};
pub use errors::{ConfigError, HandleInvalid, PoolError, PoolResult};
pub use handle::{LeaseState, ManagedHandle, Termination};
pub use pool::ResourcePool;
pub use types::{HandleId, ResourceLocation, Timestamp};
