//! Single-flight call coalescing
//!
//! Collapses concurrent calls sharing a key into one underlying piece of
//! work, fanning the single result out to every waiter. The work runs on
//! its own spawned task: it is owned by this primitive, not by the caller
//! that happened to arrive first, so one waiter going away never aborts
//! the flight for the rest.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::watch;
use tracing::warn;

pub(crate) struct SingleFlight<V> {
    inflight: Arc<Mutex<HashMap<String, watch::Receiver<Option<V>>>>>,
}

impl<V> SingleFlight<V>
where
    V: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            inflight: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Join the in-flight call for `key`, or start one running `work`.
    ///
    /// Returns `None` only if the flight terminated without publishing a
    /// value (the worker task died); callers should surface that as an
    /// abort rather than retry in a loop.
    pub async fn run<F>(&self, key: &str, work: F) -> Option<V>
    where
        F: Future<Output = V> + Send + 'static,
    {
        let mut rx = {
            let mut inflight = lock(&self.inflight);
            match inflight.get(key) {
                Some(rx) => rx.clone(),
                None => {
                    let (tx, rx) = watch::channel(None);
                    inflight.insert(key.to_owned(), rx.clone());

                    let inflight = Arc::clone(&self.inflight);
                    let key = key.to_owned();
                    tokio::spawn(async move {
                        let value = work.await;
                        // Deregister before publishing: a caller arriving
                        // after this point starts a fresh flight instead of
                        // joining a finished one.
                        lock(&inflight).remove(&key);
                        let _ = tx.send(Some(value));
                    });

                    rx
                }
            }
        };

        loop {
            if let Some(value) = rx.borrow_and_update().as_ref().cloned() {
                return Some(value);
            }
            if rx.changed().await.is_err() {
                // The worker vanished without publishing. Clear the stale
                // entry so the key does not wedge for future callers.
                let mut inflight = lock(&self.inflight);
                if let Some(current) = inflight.get(key) {
                    if current.same_channel(&rx) {
                        inflight.remove(key);
                    }
                }
                return None;
            }
        }
    }

    #[cfg(test)]
    fn inflight_len(&self) -> usize {
        lock(&self.inflight).len()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| {
        warn!("single-flight lock poisoned, recovering");
        poisoned.into_inner()
    })
}
