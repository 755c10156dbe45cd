//! Background sweep task for registered caches.
//!
//! One [`Sweeper`] serves any number of cache instances through the
//! [`SweepTarget`] seam. It runs on a single dedicated named thread at a
//! fixed interval, only ever removes entries, and never blocks readers.
//! There is no ambient global scheduler: whoever orchestrates a solving
//! session constructs the sweeper, registers caches, and owns its
//! start/stop lifecycle, so independent solves (and tests) stay isolated.

use parking_lot::{Condvar, Mutex, RwLock};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::metrics;

use super::tiered::{CacheStats, TieredCache};

/// Anything the sweeper can purge. Implemented by every [`TieredCache`].
pub trait SweepTarget: Send + Sync {
    /// Cache instance name for logging.
    fn name(&self) -> &'static str;

    /// Remove expired or reclaimed entries. Returns how many were removed.
    fn sweep(&self) -> usize;

    /// Point-in-time stats, republished as gauges after each pass.
    fn stats(&self) -> CacheStats;
}

impl<K, V> SweepTarget for TieredCache<K, V>
where
    K: Eq + std::hash::Hash + Clone + Send + Sync,
    V: Clone + Send + Sync,
{
    fn name(&self) -> &'static str {
        TieredCache::name(self)
    }

    fn sweep(&self) -> usize {
        TieredCache::sweep(self)
    }

    fn stats(&self) -> CacheStats {
        TieredCache::stats(self)
    }
}

/// Shared state between the owning handle and the sweep thread.
struct Shared {
    targets: RwLock<Vec<Arc<dyn SweepTarget>>>,
    shutdown: AtomicBool,
    /// Wakes the thread early on `stop`.
    wakeup: (Mutex<()>, Condvar),
}

/// Periodic sweep task with an explicit lifecycle.
///
/// Dropping a running sweeper stops and joins it.
pub struct Sweeper {
    interval: Duration,
    shared: Arc<Shared>,
    handle: Option<JoinHandle<()>>,
}

impl Sweeper {
    /// Create a stopped sweeper with the given pass interval.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            shared: Arc::new(Shared {
                targets: RwLock::new(Vec::new()),
                shutdown: AtomicBool::new(false),
                wakeup: (Mutex::new(()), Condvar::new()),
            }),
            handle: None,
        }
    }

    /// Register a cache. May be called before or after `start`.
    pub fn register(&self, target: Arc<dyn SweepTarget>) {
        debug!(cache = target.name(), "registering sweep target");
        self.shared.targets.write().push(target);
    }

    /// Number of registered caches.
    pub fn target_count(&self) -> usize {
        self.shared.targets.read().len()
    }

    /// Spawn the sweep thread. Calling `start` twice is a no-op.
    pub fn start(&mut self) {
        if self.handle.is_some() {
            warn!("sweeper already running");
            return;
        }
        self.shared.shutdown.store(false, Ordering::SeqCst);

        let shared = Arc::clone(&self.shared);
        let interval = self.interval;
        let handle = std::thread::Builder::new()
            .name("cache-sweeper".to_string())
            .spawn(move || run_loop(shared, interval))
            .expect("failed to spawn cache-sweeper thread");

        self.handle = Some(handle);
        info!(interval_secs = self.interval.as_secs_f64(), "sweeper started");
    }

    /// Signal the thread and join it. Safe to call when not running.
    pub fn stop(&mut self) {
        {
            // Flag and notify under the lock so the wakeup cannot slip in
            // between the thread's shutdown check and its wait.
            let _guard = self.shared.wakeup.0.lock();
            self.shared.shutdown.store(true, Ordering::SeqCst);
            self.shared.wakeup.1.notify_all();
        }
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("sweeper thread panicked");
            }
            info!("sweeper stopped");
        }
    }

    /// Run one sweep pass synchronously on the calling thread. Useful for
    /// tests and for hosts that drive maintenance themselves instead of
    /// starting the thread.
    pub fn tick(&self) -> usize {
        sweep_all(&self.shared)
    }
}

impl Drop for Sweeper {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_loop(shared: Arc<Shared>, interval: Duration) {
    debug!("sweep loop running");
    loop {
        {
            let mut guard = shared.wakeup.0.lock();
            if shared.shutdown.load(Ordering::SeqCst) {
                break;
            }
            let _timeout = shared.wakeup.1.wait_for(&mut guard, interval);
        }
        if shared.shutdown.load(Ordering::SeqCst) {
            break;
        }
        sweep_all(&shared);
    }
    debug!("sweep loop exited");
}

fn sweep_all(shared: &Shared) -> usize {
    let start = Instant::now();
    let targets = shared.targets.read().clone();
    let mut removed = 0usize;
    for target in &targets {
        removed += target.sweep();
    }
    metrics::record_sweep(removed, start.elapsed());
    if removed > 0 {
        debug!(removed, caches = targets.len(), "sweep pass removed entries");
    }
    removed
}
