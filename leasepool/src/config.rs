//! Configuration for handles and pools.
//!
//! Every tunable is a `nutype` newtype validated at construction, so a
//! configuration that deserializes successfully is always usable. Handles copy
//! what they need when they are created and never read configuration again.

use std::time::Duration;

use nutype::nutype;
use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;

/// Pool-forward duration above which a terminal call logs a warning.
///
/// Validated to be between 1ms and 10 minutes. The handle never aborts a slow
/// pool call; this only controls the warning.
#[nutype(
    validate(greater_or_equal = 1, less_or_equal = 600_000),
    default = 1_000,
    derive(
        Debug,
        Clone,
        Copy,
        PartialEq,
        Eq,
        PartialOrd,
        Ord,
        Into,
        Default,
        Serialize,
        Deserialize
    )
)]
pub struct SlowReturnThresholdMs(u64);

impl SlowReturnThresholdMs {
    /// Convert to `Duration`.
    pub fn as_duration(self) -> Duration {
        Duration::from_millis(self.into())
    }
}

/// Maximum number of leases a pool keeps outstanding at once.
#[nutype(
    validate(greater_or_equal = 1, less_or_equal = 100_000),
    default = 16,
    derive(
        Debug,
        Clone,
        Copy,
        PartialEq,
        Eq,
        PartialOrd,
        Ord,
        Into,
        Default,
        Serialize,
        Deserialize
    )
)]
pub struct MaxActiveHandles(usize);

/// Maximum number of healthy resources a pool keeps around for reuse.
///
/// Zero disables reuse: every reclaimed resource is closed.
#[nutype(
    validate(less_or_equal = 100_000),
    default = 4,
    derive(
        Debug,
        Clone,
        Copy,
        PartialEq,
        Eq,
        PartialOrd,
        Ord,
        Into,
        Default,
        Serialize,
        Deserialize
    )
)]
pub struct MaxIdleHandles(usize);

/// Settings applied to every handle a pool issues.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HandleOptions {
    /// Warn when `reclaim`/`destroy` takes longer than this.
    pub slow_return_threshold: SlowReturnThresholdMs,
}

impl HandleOptions {
    /// Sets the slow-return warning threshold.
    #[must_use]
    pub const fn with_slow_return_threshold(mut self, threshold: SlowReturnThresholdMs) -> Self {
        self.slow_return_threshold = threshold;
        self
    }
}

/// Settings for a pool implementation.
///
/// ```rust,ignore
/// let options = PoolOptions::from_json_str(r#"{
///     "max_active_handles": 32,
///     "max_idle_handles": 8,
///     "handle": { "slow_return_threshold": 250 }
/// }"#)?;
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolOptions {
    /// Upper bound on outstanding leases.
    pub max_active_handles: MaxActiveHandles,
    /// Upper bound on idle resources kept for reuse.
    pub max_idle_handles: MaxIdleHandles,
    /// Options forwarded to every issued handle.
    pub handle: HandleOptions,
}

impl PoolOptions {
    /// Parses options from JSON. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let options: Self = serde_json::from_str(json)?;
        options.validate()
    }

    /// Checks constraints that span several fields.
    pub fn validate(self) -> Result<Self, ConfigError> {
        let max_active: usize = self.max_active_handles.into();
        let max_idle: usize = self.max_idle_handles.into();
        if max_idle > max_active {
            return Err(ConfigError::InvalidValue {
                field: "max_idle_handles",
                reason: format!("{max_idle} exceeds max_active_handles ({max_active})"),
            });
        }
        Ok(self)
    }

    /// Sets the maximum number of outstanding leases.
    #[must_use]
    pub const fn with_max_active_handles(mut self, max: MaxActiveHandles) -> Self {
        self.max_active_handles = max;
        self
    }

    /// Sets the maximum number of idle resources.
    #[must_use]
    pub const fn with_max_idle_handles(mut self, max: MaxIdleHandles) -> Self {
        self.max_idle_handles = max;
        self
    }

    /// Sets the options forwarded to handles.
    #[must_use]
    pub const fn with_handle_options(mut self, handle: HandleOptions) -> Self {
        self.handle = handle;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let options = PoolOptions::default().validate().unwrap();

        assert_eq!(usize::from(options.max_active_handles), 16);
        assert_eq!(usize::from(options.max_idle_handles), 4);
        assert_eq!(options.handle.slow_return_threshold.as_duration(), Duration::from_secs(1));
    }

    #[test]
    fn parses_partial_json_with_defaults() {
        let options =
            PoolOptions::from_json_str(r#"{ "max_active_handles": 2, "max_idle_handles": 1 }"#)
                .unwrap();

        assert_eq!(usize::from(options.max_active_handles), 2);
        assert_eq!(usize::from(options.max_idle_handles), 1);
        assert_eq!(options.handle, HandleOptions::default());
    }

    #[test]
    fn parses_nested_handle_options() {
        let options =
            PoolOptions::from_json_str(r#"{ "handle": { "slow_return_threshold": 250 } }"#)
                .unwrap();

        assert_eq!(options.handle.slow_return_threshold.as_duration(), Duration::from_millis(250));
    }

    #[test]
    fn rejects_out_of_range_values() {
        let error = PoolOptions::from_json_str(r#"{ "max_active_handles": 0 }"#).unwrap_err();
        assert!(matches!(error, ConfigError::Parse(_)));

        let error =
            PoolOptions::from_json_str(r#"{ "handle": { "slow_return_threshold": 0 } }"#)
                .unwrap_err();
        assert!(matches!(error, ConfigError::Parse(_)));
    }

    #[test]
    fn rejects_more_idle_than_active() {
        let error =
            PoolOptions::from_json_str(r#"{ "max_active_handles": 2, "max_idle_handles": 3 }"#)
                .unwrap_err();

        insta::assert_snapshot!(
            error.to_string(),
            @"invalid value for 'max_idle_handles': 3 exceeds max_active_handles (2)"
        );
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(matches!(PoolOptions::from_json_str("{ not json"), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn builders_replace_fields() {
        let options = PoolOptions::default()
            .with_max_active_handles(MaxActiveHandles::try_new(8).unwrap())
            .with_max_idle_handles(MaxIdleHandles::try_new(0).unwrap())
            .with_handle_options(
                HandleOptions::default()
                    .with_slow_return_threshold(SlowReturnThresholdMs::try_new(5).unwrap()),
            );

        assert_eq!(usize::from(options.max_active_handles), 8);
        assert_eq!(usize::from(options.max_idle_handles), 0);
        assert_eq!(options.handle.slow_return_threshold.as_duration(), Duration::from_millis(5));
    }
}
