//! Leasing fake TCP sessions from an in-memory pool.
//!
//! Several workers share one pool; each leases a session, "uses" it, and
//! ends the lease with `release` or, when the session looks broken, with
//! `discard`. Run with `RUST_LOG=debug` to watch every lease being issued
//! and returned.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use leasepool::{PoolOptions, ResourceLocation};
use leasepool_memory::{Connector, InMemoryPool};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug)]
struct Session {
    id: usize,
}

impl Session {
    const fn is_broken(&self, round: usize) -> bool {
        (self.id + round) % 5 == 0
    }
}

#[derive(Debug, thiserror::Error)]
#[error("session error: {0}")]
struct SessionError(String);

#[derive(Default)]
struct SessionConnector {
    next_id: AtomicUsize,
}

impl Connector for SessionConnector {
    type Resource = Arc<Session>;
    type Error = SessionError;

    fn open(&self, location: &ResourceLocation) -> Result<Self::Resource, Self::Error> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        info!(%location, id, "session opened");
        Ok(Arc::new(Session { id }))
    }

    fn close(&self, resource: Self::Resource) -> Result<(), Self::Error> {
        info!(id = resource.id, "session closed");
        Ok(())
    }
}

fn init_logging() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_thread_names(true))
        .init();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    let options = PoolOptions::from_json_str(
        r#"{
            "max_active_handles": 4,
            "max_idle_handles": 2,
            "handle": { "slow_return_threshold": 50 }
        }"#,
    )?;
    let pool = InMemoryPool::new(
        ResourceLocation::try_new("sessions.internal:7000")?,
        SessionConnector::default(),
        options,
    )?;

    thread::scope(|scope| {
        let workers: Vec<_> = (0..4)
            .map(|worker| {
                let pool = &pool;
                scope.spawn(move || -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
                    for round in 0..5 {
                        let handle = pool.get()?;
                        if handle.access()?.is_broken(worker + round) {
                            handle.discard()?;
                        } else {
                            handle.release()?;
                        }
                    }
                    Ok(())
                })
            })
            .collect();

        for worker in workers {
            if let Ok(Err(error)) = worker.join() {
                tracing::error!(%error, "worker failed");
            }
        }
    });

    let stats = pool.stats();
    info!(?stats, "done");
    pool.close_idle()?;
    Ok(())
}
