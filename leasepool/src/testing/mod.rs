//! Testing utilities for code built on `leasepool`.
//!
//! - [`fixtures`]: a [`RecordingPool`](fixtures::RecordingPool) that counts
//!   every return it receives and can be told to fail
//! - [`generators`]: `proptest` strategies for locations and sequences of
//!   terminal calls
//! - [`assertions`]: checks for the exactly-once return contract
//!
//! ```rust,ignore
//! use leasepool::testing::prelude::*;
//!
//! let pool = RecordingPool::new();
//! let handle = pool.lease("db:5432", conn);
//! handle.release()?;
//! assert_returned_exactly_once(&pool, &handle);
//! ```

pub mod assertions;
pub mod fixtures;
pub mod generators;

pub use fixtures::RecordingPool;

/// Import everything needed for testing with:
/// ```rust,ignore
/// use leasepool::testing::prelude::*;
/// ```
pub mod prelude {
    pub use super::assertions::*;
    pub use super::fixtures::*;
    pub use super::generators::*;
}
