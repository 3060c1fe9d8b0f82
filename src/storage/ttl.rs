//! TTL Cleaner
//!
//! Background task that periodically removes expired keys. Reads already
//! hide expired entries, so the cleaner only reclaims memory.

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

use super::{ConcurrentStore, Store};
use crate::config::StoreConfig;
use crate::error::{Result, StoreError};

/// A store whose expired entries can be physically removed
pub trait Sweep: Send + Sync + 'static {
    /// Remove expired entries, returns how many were removed
    fn cleanup_expired(&self) -> usize;
}

impl<V: Send + Sync + 'static> Sweep for Store<V> {
    fn cleanup_expired(&self) -> usize {
        Store::cleanup_expired(self)
    }
}

impl<V: Send + Sync + 'static> Sweep for ConcurrentStore<V> {
    fn cleanup_expired(&self) -> usize {
        ConcurrentStore::cleanup_expired(self)
    }
}

/// Background TTL cleanup task
pub struct TtlCleaner<S> {
    store: S,
    interval: Duration,
}

impl<S: Sweep> TtlCleaner<S> {
    /// Create a new TTL cleaner
    pub fn new(store: S, interval: Duration) -> Result<Self> {
        if interval.is_zero() {
            return Err(StoreError::InvalidConfig(
                "sweep interval must be non-zero".into(),
            ));
        }
        Ok(Self { store, interval })
    }

    pub fn from_config(store: S, config: &StoreConfig) -> Result<Self> {
        config.validate()?;
        Self::new(store, config.sweep_interval)
    }

    /// Run the cleaner until `shutdown` flips to true or its sender is dropped
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately
        ticker.tick().await;
        info!("TTL cleaner started, interval: {:?}", self.interval);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let removed = self.store.cleanup_expired();
                    if removed > 0 {
                        debug!(removed = removed, "Cleaned up expired keys");
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!("TTL cleaner stopped");
    }

    /// Spawn the cleaner on the current tokio runtime
    pub fn spawn(self) -> Result<CleanerHandle> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| StoreError::NoRuntime)?;
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = runtime.spawn(self.run(shutdown_rx));
        Ok(CleanerHandle {
            shutdown_tx,
            task: Some(task),
        })
    }
}

/// Handle to a running cleaner; dropping it stops the task
#[derive(Debug)]
pub struct CleanerHandle {
    shutdown_tx: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl CleanerHandle {
    /// Signal the cleaner to stop and wait for it to finish
    pub async fn shutdown(mut self) {
        let _ = self.shutdown_tx.send(true);
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.as_ref().is_none_or(JoinHandle::is_finished)
    }
}

impl Drop for CleanerHandle {
    fn drop(&mut self) {
        let _ = self.shutdown_tx.send(true);
    }
}
