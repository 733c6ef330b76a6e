//! Property tests for the exactly-once return contract.

use std::sync::Barrier;
use std::thread;

use leasepool::testing::prelude::*;
use leasepool::{ResourceLocation, Termination};
use proptest::prelude::*;

fn terminate<R>(
    handle: &leasepool::ManagedHandle<'_, R, RecordingPool<R>>,
    termination: Termination,
) -> Result<(), leasepool::PoolError<RecordedPoolError>> {
    match termination {
        Termination::Released => handle.release(),
        Termination::Discarded => handle.discard(),
    }
}

proptest! {
    #[test]
    fn sequential_calls_forward_once_with_first_path(ops in arb_terminal_ops()) {
        let pool = RecordingPool::new();
        let handle = pool.lease("host:1", ());

        for op in &ops {
            prop_assert!(terminate(&handle, *op).is_ok());
        }

        prop_assert_eq!(pool.total_calls(), 1);
        prop_assert_eq!(handle.termination(), Some(ops[0]));
        prop_assert_eq!(pool.calls()[0].termination, ops[0]);
    }

    #[test]
    fn access_succeeds_until_first_terminal_call(reads in 0usize..20, value in any::<u32>()) {
        let pool = RecordingPool::new();
        let handle = pool.lease("host:1", value);

        for _ in 0..reads {
            prop_assert_eq!(*handle.access().unwrap(), value);
        }
        handle.release().unwrap();
        for _ in 0..reads {
            prop_assert!(handle.access().is_err());
        }
    }

    #[test]
    fn location_is_reported_unchanged(location in arb_resource_location()) {
        let pool = RecordingPool::new();
        let handle = pool.lease(location.as_ref(), ());

        prop_assert_eq!(handle.location(), &location);
        handle.discard().unwrap();
        prop_assert_eq!(handle.location(), &location);
        prop_assert_eq!(&pool.calls()[0].location, &location);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn concurrent_calls_forward_exactly_once(
        ops in prop::collection::vec(arb_termination(), 2..9)
    ) {
        let pool = RecordingPool::new();
        let handle = pool.lease("host:1", "R");
        let barrier = Barrier::new(ops.len());

        thread::scope(|scope| {
            for op in &ops {
                let handle = &handle;
                let barrier = &barrier;
                scope.spawn(move || {
                    barrier.wait();
                    terminate(handle, *op).expect("no pool failure armed");
                });
            }
        });

        prop_assert_eq!(pool.total_calls(), 1);
        let winner = handle.termination().expect("handle terminated");
        prop_assert!(ops.contains(&winner));
        assert_returned_exactly_once(&pool, &handle);
    }
}

#[test]
fn host_port_location_is_accepted() {
    let location = ResourceLocation::try_new("db-1.internal:5432").expect("valid");
    assert_eq!(location.to_string(), "db-1.internal:5432");
}
