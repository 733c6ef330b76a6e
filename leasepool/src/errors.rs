//! Error types for `leasepool`.
//!
//! Errors are split by the operation that produces them:
//!
//! - **`HandleInvalid`**: the handle was already terminated when its resource
//!   was requested. Permanent for that handle.
//! - **`PoolError`**: the owning pool failed while reclaiming or destroying a
//!   resource on the winning terminal call. The handle stays terminated.
//! - **`ConfigError`**: pool or handle configuration could not be parsed or
//!   failed validation.
//!
//! Losing a termination race is not represented here: a second `release` or
//! `discard` returns `Ok(())`.

use thiserror::Error;

use crate::handle::Termination;
use crate::types::ResourceLocation;

/// Returned by [`ManagedHandle::access`](crate::handle::ManagedHandle::access)
/// once the handle has been released or discarded.
///
/// The condition is permanent for that handle. The stale resource is still
/// reachable through
/// [`ManagedHandle::returned_resource`](crate::handle::ManagedHandle::returned_resource)
/// for diagnostics, but it is back in the pool's hands (or destroyed) and must
/// not be used as if it were leased.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("resource handle for '{location}' is no longer valid ({termination})")]
pub struct HandleInvalid {
    location: ResourceLocation,
    termination: Termination,
}

impl HandleInvalid {
    pub(crate) const fn new(location: ResourceLocation, termination: Termination) -> Self {
        Self {
            location,
            termination,
        }
    }

    /// Location of the terminated handle.
    pub const fn location(&self) -> &ResourceLocation {
        &self.location
    }

    /// Which terminal path ended the lease.
    pub const fn termination(&self) -> Termination {
        self.termination
    }
}

/// Failure reported by the owning pool on the winning `release`/`discard`.
///
/// The pool's own error is kept untouched; use [`PoolError::into_inner`] to get
/// it back or [`std::error::Error::source`] to walk to it.
#[derive(Debug, Error)]
pub enum PoolError<E>
where
    E: std::error::Error + 'static,
{
    /// The pool could not return the resource to its reusable inventory.
    #[error("pool failed to reclaim resource at '{location}': {source}")]
    ReclaimFailed {
        /// Location of the handle being released
        location: ResourceLocation,
        /// Error raised by the pool
        #[source]
        source: E,
    },

    /// The pool could not dispose of a discarded resource.
    #[error("pool failed to destroy resource at '{location}': {source}")]
    DestroyFailed {
        /// Location of the handle being discarded
        location: ResourceLocation,
        /// Error raised by the pool
        #[source]
        source: E,
    },
}

impl<E> PoolError<E>
where
    E: std::error::Error + 'static,
{
    /// Location of the handle whose return failed.
    pub const fn location(&self) -> &ResourceLocation {
        match self {
            Self::ReclaimFailed { location, .. } | Self::DestroyFailed { location, .. } => location,
        }
    }

    /// The terminal path that triggered the failing pool call.
    pub const fn termination(&self) -> Termination {
        match self {
            Self::ReclaimFailed { .. } => Termination::Released,
            Self::DestroyFailed { .. } => Termination::Discarded,
        }
    }

    /// Unwraps the pool's error.
    pub fn into_inner(self) -> E {
        match self {
            Self::ReclaimFailed { source, .. } | Self::DestroyFailed { source, .. } => source,
        }
    }
}

/// Result of a terminal handle operation.
pub type PoolResult<E> = Result<(), PoolError<E>>;

/// Errors raised while loading pool or handle configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration document is not valid JSON or has the wrong shape.
    /// Out-of-range values are reported here too, since validation runs
    /// during deserialization.
    #[error("invalid configuration: {0}")]
    Parse(#[from] serde_json::Error),

    /// A configuration value is outside its allowed range.
    #[error("invalid value for '{field}': {reason}")]
    InvalidValue {
        /// Name of the offending field
        field: &'static str,
        /// Validation message
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[derive(Debug, Error, PartialEq, Eq)]
    #[error("{0}")]
    struct DiskFull(&'static str);

    fn location() -> ResourceLocation {
        ResourceLocation::try_new("host:1").unwrap()
    }

    #[test]
    fn handle_invalid_message_names_location_and_path() {
        let error = HandleInvalid::new(location(), Termination::Discarded);

        insta::assert_snapshot!(
            error.to_string(),
            @"resource handle for 'host:1' is no longer valid (discarded)"
        );
        assert_eq!(error.location(), &location());
        assert_eq!(error.termination(), Termination::Discarded);
    }

    #[test]
    fn handle_invalid_converts_into_boxed_errors() {
        fn fails() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
            let access: Result<(), HandleInvalid> =
                Err(HandleInvalid::new(location(), Termination::Released));
            access?;
            Ok(())
        }

        let error = fails().unwrap_err();
        assert!(error.downcast_ref::<HandleInvalid>().is_some());
    }

    #[test]
    fn reclaim_failure_keeps_pool_error_verbatim() {
        let error = PoolError::ReclaimFailed {
            location: location(),
            source: DiskFull("disk full"),
        };

        insta::assert_snapshot!(
            error.to_string(),
            @"pool failed to reclaim resource at 'host:1': disk full"
        );
        assert_eq!(error.termination(), Termination::Released);
        assert_eq!(error.source().map(ToString::to_string), Some("disk full".to_string()));
        assert_eq!(error.into_inner(), DiskFull("disk full"));
    }

    #[test]
    fn destroy_failure_reports_discard_path() {
        let error = PoolError::DestroyFailed {
            location: location(),
            source: DiskFull("socket already closed"),
        };

        assert_eq!(error.termination(), Termination::Discarded);
        assert_eq!(error.location().as_ref(), "host:1");
    }
}
