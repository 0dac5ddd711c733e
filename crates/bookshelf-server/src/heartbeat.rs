//! Periodic catalog heartbeat.
//!
//! Logs the catalog size and purges expired cache entries on every tick.
//! Books are never modified.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{error, info};

use crate::service::BookService;

/// Handle to a running heartbeat task.
pub struct Heartbeat {
    shutdown_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
    ticks: Arc<AtomicU64>,
}

impl Heartbeat {
    /// Start the heartbeat in a background task.
    pub fn spawn(service: Arc<BookService>, period: Duration) -> Self {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let ticks = Arc::new(AtomicU64::new(0));
        let counter = ticks.clone();

        let handle = tokio::spawn(async move {
            info!(interval_secs = period.as_secs(), "Heartbeat started");
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        counter.fetch_add(1, Ordering::Relaxed);
                        beat(&service).await;
                    }
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            info!("Heartbeat shutting down");
                            break;
                        }
                    }
                }
            }
        });

        Self {
            shutdown_tx,
            handle,
            ticks,
        }
    }

    /// Number of ticks completed so far.
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }

    /// Signal the task to stop and wait for it to finish.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        if let Err(e) = self.handle.await {
            error!(error = %e, "Heartbeat task failed");
        }
    }
}

async fn beat(service: &BookService) {
    let purged = service.purge_expired_cache();
    match service.count().await {
        Ok(books) => {
            let cache = service.cache_stats();
            info!(
                books,
                cache.entries = cache.entries,
                cache.hits = cache.hits,
                cache.misses = cache.misses,
                purged,
                "catalog heartbeat"
            );
        }
        Err(e) => error!(error = %e, "heartbeat could not count books"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheBackend, PagedQueryCache};
    use bookshelf_db_memory::InMemoryBookStorage;
    use bookshelf_storage::PageRequest;

    fn service(ttl: Duration) -> Arc<BookService> {
        let cache = PagedQueryCache::new(CacheBackend::new(), ttl);
        Arc::new(BookService::new(Arc::new(InMemoryBookStorage::new()), cache))
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_until_shutdown() {
        let heartbeat = Heartbeat::spawn(service(Duration::from_secs(30)), Duration::from_secs(10));

        // The first tick fires immediately, then one per period.
        tokio::time::sleep(Duration::from_secs(25)).await;
        assert_eq!(heartbeat.ticks(), 3);

        heartbeat.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_purges_expired_pages() {
        let service = service(Duration::from_secs(5));
        service.get_paged(&PageRequest::new(1, 10)).await.unwrap();
        assert_eq!(service.cache_stats().entries, 1);

        let heartbeat = Heartbeat::spawn(service.clone(), Duration::from_secs(10));
        tokio::time::sleep(Duration::from_secs(15)).await;

        assert_eq!(service.cache_stats().entries, 0);
        heartbeat.shutdown().await;
    }
}
