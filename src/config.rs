//! Store Configuration

use std::time::Duration;

use crate::error::{Result, StoreError};

/// Store configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Pre-allocated number of entries
    pub initial_capacity: usize,

    /// Shard count for `ConcurrentStore` (0 = auto-detect)
    pub shard_amount: usize,

    /// Interval between background sweeps
    pub sweep_interval: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            initial_capacity: 0,
            shard_amount: 0, // Auto-detect from CPU count
            sweep_interval: Duration::from_secs(10),
        }
    }
}

impl StoreConfig {
    /// Set the initial capacity
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity;
        self
    }

    /// Set the shard count (must be a power of two, or 0 for auto)
    pub fn with_shard_amount(mut self, shard_amount: usize) -> Self {
        self.shard_amount = shard_amount;
        self
    }

    /// Set the background sweep interval
    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }

    /// Shard count actually used, resolving auto-detection
    pub fn effective_shard_amount(&self) -> usize {
        if self.shard_amount == 0 {
            (num_cpus::get() * 4).next_power_of_two()
        } else {
            self.shard_amount
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.sweep_interval.is_zero() {
            return Err(StoreError::InvalidConfig(
                "sweep interval must be non-zero".into(),
            ));
        }
        if self.shard_amount != 0
            && (self.shard_amount < 2 || !self.shard_amount.is_power_of_two())
        {
            return Err(StoreError::InvalidConfig(format!(
                "shard amount must be a power of two greater than 1, got {}",
                self.shard_amount
            )));
        }
        Ok(())
    }
}
