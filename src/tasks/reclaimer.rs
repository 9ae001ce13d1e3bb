//! TTL Reclaimer Task
//!
//! Background task that periodically removes expired cache entries.

use std::hash::Hash;
use std::sync::{Arc, Mutex, Weak};
use std::time::{Duration, Instant};

use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::cache::{lock_store, LruStore};
use crate::error::{CacheError, Result};

/// Handle to a running reclaimer task.
///
/// The task holds only a weak reference to the store and stops when the store
/// is dropped, when `shutdown` is awaited, or when this handle is dropped.
#[derive(Debug)]
pub struct Reclaimer {
    shutdown_tx: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl Reclaimer {
    /// Spawns a task on the current tokio runtime that sweeps `store` every
    /// `interval`.
    ///
    /// The first sweep happens one full interval after spawning.
    ///
    /// # Errors
    /// - `RuntimeUnavailable` when called outside a tokio runtime
    /// - `InvalidReclaimInterval` when `interval` is zero
    pub fn spawn<K, V>(store: &Arc<Mutex<LruStore<K, V>>>, interval: Duration) -> Result<Self>
    where
        K: Hash + Eq + Clone + Send + 'static,
        V: Clone + Send + 'static,
    {
        if interval.is_zero() {
            return Err(CacheError::InvalidReclaimInterval);
        }
        let runtime = Handle::try_current().map_err(|_| CacheError::RuntimeUnavailable)?;

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let handle = runtime.spawn(run_reclaimer(Arc::downgrade(store), interval, shutdown_rx));

        Ok(Self {
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        })
    }

    /// Returns true until the task has exited.
    pub fn is_running(&self) -> bool {
        self.handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Signals the task to stop and waits for it to exit.
    pub async fn shutdown(mut self) {
        self.signal_stop();
        if let Some(handle) = self.handle.take() {
            if let Err(err) = handle.await {
                warn!(error = %err, "TTL reclaimer ended abnormally");
            }
        }
    }

    fn signal_stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            // The task may already be gone; nothing to signal then
            let _ = tx.send(());
        }
    }
}

impl Drop for Reclaimer {
    fn drop(&mut self) {
        self.signal_stop();
    }
}

async fn run_reclaimer<K, V>(
    store: Weak<Mutex<LruStore<K, V>>>,
    interval: Duration,
    mut shutdown_rx: oneshot::Receiver<()>,
) where
    K: Hash + Eq + Clone,
    V: Clone,
{
    info!(
        "Starting TTL reclaimer with interval of {} ms",
        interval.as_millis()
    );

    let mut ticker = time::interval_at(time::Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;

            _ = &mut shutdown_rx => break,

            _ = ticker.tick() => {
                let Some(store) = store.upgrade() else {
                    debug!("Cache dropped, TTL reclaimer exiting");
                    break;
                };

                let removed = lock_store(&store).purge_expired(Instant::now());

                if removed > 0 {
                    info!("TTL sweep: removed {} expired entries", removed);
                } else {
                    debug!("TTL sweep: no expired entries found");
                }
            }
        }
    }

    info!("TTL reclaimer stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CacheConfig;

    fn ttl_store(capacity: usize) -> Arc<Mutex<LruStore<String, String>>> {
        let config = CacheConfig::new(capacity)
            .with_ttl(true)
            .with_expire_on_read(false);
        Arc::new(Mutex::new(LruStore::from_config(&config).unwrap()))
    }

    fn insert(store: &Arc<Mutex<LruStore<String, String>>>, key: &str, ttl: Duration) {
        lock_store(store)
            .set_with_expiry(key.to_string(), "value".to_string(), ttl, Instant::now())
            .unwrap();
    }

    #[tokio::test]
    async fn test_reclaimer_removes_expired_entries() {
        let store = ttl_store(100);
        insert(&store, "expire_soon", Duration::from_millis(50));
        insert(&store, "long_lived", Duration::from_secs(3600));

        let reclaimer = Reclaimer::spawn(&store, Duration::from_millis(100)).unwrap();

        // Deadline plus more than one interval
        tokio::time::sleep(Duration::from_millis(400)).await;

        {
            let mut guard = lock_store(&store);
            let now = Instant::now();
            assert!(!guard.contains(&"expire_soon".to_string(), now));
            assert!(guard.contains(&"long_lived".to_string(), now));
            assert_eq!(guard.stats().expirations, 1);
        }

        reclaimer.shutdown().await;
    }

    #[tokio::test]
    async fn test_reclaimer_waits_one_interval_before_first_sweep() {
        let store = ttl_store(10);
        insert(&store, "key", Duration::ZERO);

        let reclaimer = Reclaimer::spawn(&store, Duration::from_secs(3600)).unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(lock_store(&store).len(), 1);
        reclaimer.shutdown().await;
    }

    #[tokio::test]
    async fn test_reclaimer_shutdown_joins_task() {
        let store = ttl_store(10);
        let reclaimer = Reclaimer::spawn(&store, Duration::from_secs(3600)).unwrap();
        assert!(reclaimer.is_running());

        tokio::time::timeout(Duration::from_secs(1), reclaimer.shutdown())
            .await
            .expect("shutdown should not hang");
    }

    #[tokio::test]
    async fn test_reclaimer_stops_when_handle_dropped() {
        let store = ttl_store(10);
        let mut reclaimer = Reclaimer::spawn(&store, Duration::from_secs(3600)).unwrap();
        let handle = reclaimer.handle.take().unwrap();

        drop(reclaimer);

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("task should exit after its handle is dropped")
            .unwrap();
    }

    #[tokio::test]
    async fn test_reclaimer_stops_when_store_dropped() {
        let store = ttl_store(10);
        let mut reclaimer = Reclaimer::spawn(&store, Duration::from_millis(20)).unwrap();
        let handle = reclaimer.handle.take().unwrap();

        drop(store);

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("task should exit once the store is gone")
            .unwrap();
        drop(reclaimer);
    }

    #[test]
    fn test_reclaimer_requires_runtime() {
        let store = ttl_store(10);
        let result = Reclaimer::spawn(&store, Duration::from_secs(1));
        assert!(matches!(result, Err(CacheError::RuntimeUnavailable)));
    }

    #[tokio::test]
    async fn test_reclaimer_rejects_zero_interval() {
        let store = ttl_store(10);
        let result = Reclaimer::spawn(&store, Duration::ZERO);
        assert!(matches!(result, Err(CacheError::InvalidReclaimInterval)));
    }
}
