//! Assertions for the exactly-once return contract.

use crate::handle::ManagedHandle;
use crate::testing::fixtures::RecordingPool;

/// Asserts that `pool` received exactly one return for `handle`, and that
/// the recorded path matches the handle's own termination.
///
/// # Panics
/// Panics if the handle is still active, was never returned, or was returned
/// more than once.
pub fn assert_returned_exactly_once<R>(
    pool: &RecordingPool<R>,
    handle: &ManagedHandle<'_, R, RecordingPool<R>>,
) {
    let calls = pool.calls_for(handle.id());
    assert_eq!(
        calls.len(),
        1,
        "handle {} at '{}' was returned {} times: {calls:?}",
        handle.id(),
        handle.location(),
        calls.len()
    );

    let termination = handle
        .termination()
        .unwrap_or_else(|| panic!("handle {} is still active", handle.id()));
    assert_eq!(
        calls[0].termination, termination,
        "pool saw {} but handle reports {}",
        calls[0].termination, termination
    );
    assert!(
        !calls[0].was_active,
        "pool was called while handle {} was still active",
        handle.id()
    );
}

/// Asserts that the pool was not contacted for `handle`.
///
/// # Panics
/// Panics if any return was recorded for the handle.
pub fn assert_not_returned<R>(
    pool: &RecordingPool<R>,
    handle: &ManagedHandle<'_, R, RecordingPool<R>>,
) {
    let calls = pool.calls_for(handle.id());
    assert!(calls.is_empty(), "handle {} was returned early: {calls:?}", handle.id());
}
