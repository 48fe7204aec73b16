use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use futures::future::{BoxFuture, FutureExt, Shared};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// The spawned work for a key ended without producing an output
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("in-flight work aborted: {0}")]
pub struct FlightAborted(String);

type Pending<T> = Shared<BoxFuture<'static, Result<T, FlightAborted>>>;

#[derive(Clone)]
struct Flight<T: Clone> {
    id: u64,
    pending: Pending<T>,
}

/// Per-key suppression of duplicate in-flight work
///
/// The first caller for a key (the leader) spawns the work; callers that
/// arrive while it is still pending await the same output instead of
/// starting their own. The work runs on its own task, so it completes and
/// clears its slot even when every caller has gone away. Nothing is
/// remembered once the work completes.
pub struct SingleFlight<T>
where
    T: Clone + Send + Sync + 'static,
{
    inflight: Arc<DashMap<String, Flight<T>>>,
    next_id: AtomicU64,
}

impl<T> SingleFlight<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            inflight: Arc::new(DashMap::new()),
            next_id: AtomicU64::new(0),
        }
    }

    /// Number of keys with work currently pending
    pub fn in_flight(&self) -> usize {
        self.inflight.len()
    }

    /// Run `func` for `key` unless the same key is already in flight
    ///
    /// Returns the output and whether this caller was the leader. Followers
    /// never call `func`. Must be called from within a tokio runtime.
    pub async fn work<F, Fut>(&self, key: &str, func: F) -> (Result<T, FlightAborted>, bool)
    where
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = T> + Send + 'static,
    {
        let (pending, leader) = match self.inflight.entry(key.to_string()) {
            Entry::Occupied(entry) => (entry.get().pending.clone(), false),
            Entry::Vacant(entry) => {
                let id = self.next_id.fetch_add(1, Ordering::Relaxed);
                let inflight = Arc::clone(&self.inflight);
                let owned_key = key.to_string();
                let work = func();

                // Only this flight's slot is cleared, never a newer one for the same key
                let handle = tokio::spawn(async move {
                    let output = work.await;
                    inflight.remove_if(&owned_key, |_, flight| flight.id == id);
                    output
                });

                let pending = async move {
                    handle.await.map_err(|e| FlightAborted(e.to_string()))
                }
                .boxed()
                .shared();

                entry.insert(Flight {
                    id,
                    pending: pending.clone(),
                });
                (pending, true)
            }
        };

        (pending.await, leader)
    }
}

impl<T> Default for SingleFlight<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for SingleFlight<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SingleFlight")
            .field("in_flight", &self.inflight.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Notify;

    #[tokio::test]
    async fn test_single_caller_leads() {
        let group: SingleFlight<u32> = SingleFlight::new();

        let (value, leader) = group.work("k", || async { 7 }).await;

        assert_eq!(value, Ok(7));
        assert!(leader);
        assert_eq!(group.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_execution() {
        let group: Arc<SingleFlight<String>> = Arc::new(SingleFlight::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let release = Arc::new(Notify::new());

        let mut handles = Vec::new();
        for _ in 0..8 {
            let group = Arc::clone(&group);
            let calls = Arc::clone(&calls);
            let release = Arc::clone(&release);
            handles.push(tokio::spawn(async move {
                group
                    .work("shared", move || async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        release.notified().await;
                        "done".to_string()
                    })
                    .await
            }));
        }

        // Let every task register before the work is allowed to finish
        while group.in_flight() == 0 {
            tokio::task::yield_now().await;
        }
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        release.notify_one();

        let mut leaders = 0;
        for handle in handles {
            let (value, leader) = handle.await.unwrap();
            assert_eq!(value.unwrap(), "done");
            if leader {
                leaders += 1;
            }
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(leaders, 1);
        assert_eq!(group.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_distinct_keys_run_independently() {
        let group: SingleFlight<&'static str> = SingleFlight::new();

        let (a, b) = tokio::join!(
            group.work("a", || async { "a" }),
            group.work("b", || async { "b" }),
        );

        assert_eq!(a, (Ok("a"), true));
        assert_eq!(b, (Ok("b"), true));
    }

    #[tokio::test]
    async fn test_completed_work_is_not_reused() {
        let group: SingleFlight<u32> = SingleFlight::new();

        let (first, _) = group.work("k", || async { 1 }).await;
        let (second, leader) = group.work("k", || async { 2 }).await;

        assert_eq!(first, Ok(1));
        assert_eq!(second, Ok(2));
        assert!(leader);
    }

    #[tokio::test]
    async fn test_abandoned_work_still_completes_and_clears_slot() {
        let group: Arc<SingleFlight<&'static str>> = Arc::new(SingleFlight::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let leader = {
            let group = Arc::clone(&group);
            let calls = Arc::clone(&calls);
            tokio::spawn(async move {
                group
                    .work("k", move || async move {
                        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
                        calls.fetch_add(1, Ordering::SeqCst);
                        "abandoned"
                    })
                    .await
            })
        };

        // Drop the only caller while its work is pending
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert_eq!(group.in_flight(), 1);
        leader.abort();
        assert!(leader.await.unwrap_err().is_cancelled());

        // The spawned work runs to the end and removes its own entry
        tokio::time::sleep(std::time::Duration::from_millis(200)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(group.in_flight(), 0);

        let (value, leader) = group.work("k", || async { "fresh" }).await;
        assert_eq!(value, Ok("fresh"));
        assert!(leader);
    }
}
