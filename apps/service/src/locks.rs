use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use tokio::sync::Mutex;

/// One async mutex per key, created on first use and dropped once nobody
/// holds or waits on it.
#[derive(Debug, Default)]
pub(crate) struct KeyedLocks {
    map: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl KeyedLocks {
    /// Run `work` while holding the lock for `key`
    pub(crate) async fn with<T>(&self, key: &str, work: impl Future<Output = T>) -> T {
        let lock = {
            let mut map = self.map.lock().await;
            Arc::clone(map.entry(key.to_string()).or_default())
        };

        let result = {
            let _guard = lock.lock().await;
            work.await
        };

        // Clones are only taken under the map lock, so a count of one here
        // means no other task holds or is queued on this entry.
        let mut map = self.map.lock().await;
        drop(lock);
        if map.get(key).is_some_and(|entry| Arc::strong_count(entry) == 1) {
            map.remove(key);
        }
        result
    }

    #[cfg(test)]
    pub(crate) async fn len(&self) -> usize {
        self.map.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_entries_are_dropped_after_use() {
        let locks = KeyedLocks::default();
        for key in ["a", "b", "c"] {
            assert_eq!(locks.with(key, async { key.len() }).await, 1);
        }
        assert_eq!(locks.len().await, 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_same_key_is_serialized() {
        let locks = Arc::new(KeyedLocks::default());
        let inside = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let (locks, inside, peak) = (Arc::clone(&locks), Arc::clone(&inside), Arc::clone(&peak));
                tokio::spawn(async move {
                    locks
                        .with("shared", async {
                            let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                            peak.fetch_max(now, Ordering::SeqCst);
                            tokio::time::sleep(Duration::from_millis(5)).await;
                            inside.fetch_sub(1, Ordering::SeqCst);
                        })
                        .await
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }

        assert_eq!(peak.load(Ordering::SeqCst), 1);
        assert_eq!(locks.len().await, 0);
    }
}
