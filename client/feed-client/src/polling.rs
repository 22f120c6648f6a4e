//! Fixed-interval refresh of server lists
//!
//! A [`Poller`] owns a background task that re-fetches a list on every tick and
//! publishes the result through a `watch` channel, replacing the previous value
//! wholesale. Dropping the poller stops the task.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::error::{ClientError, Result};
use crate::models::Keyed;

const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Collapse entries sharing a key: the last occurrence wins and takes the
/// position of the first
pub fn merge_by_id<T: Keyed>(items: Vec<T>) -> Vec<T> {
    let mut positions: HashMap<T::Key, usize> = HashMap::with_capacity(items.len());
    let mut merged: Vec<T> = Vec::with_capacity(items.len());

    for item in items {
        match positions.get(&item.key()) {
            Some(&pos) => merged[pos] = item,
            None => {
                positions.insert(item.key(), merged.len());
                merged.push(item);
            }
        }
    }
    merged
}

pub struct Poller {
    name: &'static str,
    shutdown_tx: watch::Sender<()>,
    handle: JoinHandle<()>,
}

impl Poller {
    /// Start polling. The first fetch runs immediately, then once per `interval`.
    /// Must be called from inside a Tokio runtime.
    pub fn spawn<T, F, Fut>(
        name: &'static str,
        interval: Duration,
        fetch: F,
        sink: Arc<watch::Sender<Vec<T>>>,
    ) -> Self
    where
        T: Keyed + Send + Sync + 'static,
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = Result<Vec<T>>> + Send + 'static,
    {
        let (shutdown_tx, shutdown_rx) = watch::channel(());
        let interval = interval.max(MIN_INTERVAL);

        info!(poller = name, interval_ms = interval.as_millis() as u64, "Starting poller");
        let handle = tokio::spawn(poll_loop(name, interval, fetch, sink, shutdown_rx));

        Self {
            name,
            shutdown_tx,
            handle,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// False once the task has exited (stopped, or halted by a 401)
    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    pub fn stop(self) {}
}

impl Drop for Poller {
    fn drop(&mut self) {
        let _ = self.shutdown_tx.send(());
        self.handle.abort();
    }
}

async fn poll_loop<T, F, Fut>(
    name: &'static str,
    interval: Duration,
    mut fetch: F,
    sink: Arc<watch::Sender<Vec<T>>>,
    mut shutdown: watch::Receiver<()>,
) where
    T: Keyed,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Vec<T>>>,
{
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = shutdown.changed() => {
                debug!(poller = name, "Poller shutting down");
                break;
            }
            _ = ticker.tick() => {
                match fetch().await {
                    Ok(items) => {
                        let items = merge_by_id(items);
                        debug!(poller = name, count = items.len(), "Poll tick published");
                        sink.send_replace(items);
                    }
                    Err(ClientError::Unauthorized) => {
                        warn!(poller = name, "Session rejected, stopping poller");
                        break;
                    }
                    Err(e) => {
                        warn!(poller = name, error = %e, "Poll tick failed, retrying next interval");
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Clone, PartialEq)]
    struct Item {
        id: i64,
        label: &'static str,
    }

    impl Keyed for Item {
        type Key = i64;

        fn key(&self) -> i64 {
            self.id
        }
    }

    fn item(id: i64, label: &'static str) -> Item {
        Item { id, label }
    }

    #[test]
    fn test_merge_last_wins_first_position() {
        let merged = merge_by_id(vec![
            item(1, "a"),
            item(2, "b"),
            item(1, "a2"),
            item(3, "c"),
            item(2, "b2"),
        ]);
        assert_eq!(merged, vec![item(1, "a2"), item(2, "b2"), item(3, "c")]);
    }

    #[test]
    fn test_merge_empty() {
        assert!(merge_by_id(Vec::<Item>::new()).is_empty());
    }

    #[tokio::test]
    async fn test_poller_publishes_deduplicated_list() {
        let sink = Arc::new(watch::channel(Vec::<Item>::new()).0);
        let mut rx = sink.subscribe();

        let _poller = Poller::spawn(
            "items",
            Duration::from_millis(20),
            || async { Ok(vec![item(1, "old"), item(1, "new")]) },
            sink.clone(),
        );

        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow(), vec![item(1, "new")]);
    }

    #[tokio::test]
    async fn test_drop_stops_fetching() {
        let calls = Arc::new(AtomicUsize::new(0));
        let sink = Arc::new(watch::channel(Vec::<Item>::new()).0);

        let counter = calls.clone();
        let poller = Poller::spawn(
            "items",
            Duration::from_millis(10),
            move || {
                counter.fetch_add(1, Ordering::SeqCst);
                async { Ok(vec![]) }
            },
            sink,
        );
        tokio::time::sleep(Duration::from_millis(35)).await;
        drop(poller);

        let after_drop = calls.load(Ordering::SeqCst);
        assert!(after_drop >= 1);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(calls.load(Ordering::SeqCst), after_drop);
    }

    #[tokio::test]
    async fn test_failed_tick_keeps_previous_list() {
        let calls = Arc::new(AtomicUsize::new(0));
        let sink = Arc::new(watch::channel(Vec::<Item>::new()).0);
        let mut rx = sink.subscribe();

        let counter = calls.clone();
        let poller = Poller::spawn(
            "items",
            Duration::from_millis(10),
            move || {
                let n = counter.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n == 0 {
                        Ok(vec![item(1, "a")])
                    } else {
                        Err(ClientError::Transport("offline".into()))
                    }
                }
            },
            sink,
        );

        rx.changed().await.unwrap();
        tokio::time::sleep(Duration::from_millis(40)).await;
        assert!(calls.load(Ordering::SeqCst) > 1);
        assert!(poller.is_running());
        assert_eq!(*rx.borrow(), vec![item(1, "a")]);
    }

    #[tokio::test]
    async fn test_unauthorized_stops_poller() {
        let sink = Arc::new(watch::channel(Vec::<Item>::new()).0);
        let poller = Poller::spawn(
            "items",
            Duration::from_millis(10),
            || async { Err(ClientError::Unauthorized) },
            sink,
        );

        tokio::time::sleep(Duration::from_millis(40)).await;
        assert!(!poller.is_running());
    }
}
