use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use std::sync::Arc;

/// In-memory TTL cache. Expired entries are kept so callers can fall back to
/// the last known value when the upstream is unavailable.
#[derive(Debug, Clone)]
pub struct Cache<T> {
    data: Arc<Mutex<HashMap<String, (T, Instant)>>>,
    ttl: Duration,
}

impl<T: Clone> Cache<T> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            data: Arc::new(Mutex::new(HashMap::new())),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Value for `key` if it is younger than the TTL.
    pub async fn get(&self, key: &str) -> Option<T> {
        let data = self.data.lock().await;
        if let Some((value, timestamp)) = data.get(key) {
            if timestamp.elapsed() < self.ttl {
                return Some(value.clone());
            }
        }
        None
    }

    /// Value for `key` regardless of age.
    pub async fn get_stale(&self, key: &str) -> Option<T> {
        self.data.lock().await.get(key).map(|(value, _)| value.clone())
    }

    pub async fn set(&self, key: String, value: T) {
        let mut data = self.data.lock().await;
        data.insert(key, (value, Instant::now()));
    }

    pub async fn clear(&self) {
        self.data.lock().await.clear();
    }

    pub async fn len(&self) -> usize {
        self.data.lock().await.len()
    }
}
