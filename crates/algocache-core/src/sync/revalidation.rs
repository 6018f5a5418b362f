//! Single-shot staleness notification for a read served from cache.

use std::future::Future;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, error};

/// Sending half handed to the background revalidation task.
pub(crate) struct StaleNotifier<T> {
    tx: oneshot::Sender<T>,
}

impl<T> StaleNotifier<T> {
    pub(crate) fn notify(self, fresh: T) {
        if self.tx.send(fresh).is_err() {
            debug!("Stale value dropped - nobody is listening");
        }
    }
}

/// Handle on the background refresh started by a cache-hit read.
///
/// The refresh runs to completion whether or not this handle is kept:
/// dropping it only detaches. [`stale`](Self::stale) yields the newer value
/// at most once; it yields `None` when the cached value was already current,
/// when the refresh failed, or when no refresh was started.
pub struct Revalidation<T> {
    stale: Option<oneshot::Receiver<T>>,
    task: Option<JoinHandle<()>>,
}

impl<T: Send + 'static> Revalidation<T> {
    /// No background work: the value was fetched fresh or served offline.
    pub fn none() -> Self {
        Self {
            stale: None,
            task: None,
        }
    }

    pub(crate) fn spawn<F, Fut>(refresh: F) -> Self
    where
        F: FnOnce(StaleNotifier<T>) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let task = tokio::spawn(refresh(StaleNotifier { tx }));
        Self {
            stale: Some(rx),
            task: Some(task),
        }
    }

    /// Whether a background refresh was started for this read.
    pub fn is_pending(&self) -> bool {
        self.task.is_some()
    }

    /// Wait for the newer value, if any.
    pub async fn stale(&mut self) -> Option<T> {
        match self.stale.take() {
            Some(rx) => rx.await.ok(),
            None => None,
        }
    }

    /// Wait until the background refresh, including its cache writes, is done.
    pub async fn settled(self) {
        if let Some(task) = self.task {
            if let Err(e) = task.await {
                error!(error = %e, "Background revalidation task failed");
            }
        }
    }

    /// Invoke `on_stale` with the newer value when it arrives.
    pub fn on_stale<F>(mut self, on_stale: F)
    where
        F: FnOnce(T) + Send + 'static,
    {
        if let Some(rx) = self.stale.take() {
            tokio::spawn(async move {
                if let Ok(fresh) = rx.await {
                    on_stale(fresh);
                }
            });
        }
    }

    /// Transform the stale payload, keeping the same background task.
    pub fn map<U, F>(self, f: F) -> Revalidation<U>
    where
        U: Send + 'static,
        F: FnOnce(T) -> U + Send + 'static,
    {
        let stale = self.stale.map(|rx| {
            let (tx, out) = oneshot::channel();
            tokio::spawn(async move {
                if let Ok(fresh) = rx.await {
                    let _ = tx.send(f(fresh));
                }
            });
            out
        });
        Revalidation {
            stale,
            task: self.task,
        }
    }
}

impl<T> std::fmt::Debug for Revalidation<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Revalidation")
            .field("pending", &self.task.is_some())
            .finish()
    }
}
