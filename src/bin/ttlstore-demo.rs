//! TTLSTORE Demo Binary
//!
//! Sets one expiring and one permanent key, waits past the first key's
//! TTL, then deletes the permanent one, logging every read.

use std::time::Duration;

use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};
use ttlstore::{CleanerHandle, ConcurrentStore, Store, StoreConfig, TtlCleaner};

/// TTLSTORE Demo - expiring key-value store walkthrough
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// TTL in seconds for the expiring key
    #[arg(long, default_value_t = 10)]
    ttl_secs: u64,

    /// Seconds to wait before reading again
    #[arg(long, default_value_t = 15)]
    wait_secs: u64,

    /// Run a background sweep at this interval in seconds
    #[arg(long)]
    sweep_interval_secs: Option<u64>,

    /// Use the sharded store instead of the single-lock store
    #[arg(long, default_value_t = false)]
    concurrent: bool,
}

/// The operations the walkthrough needs from either store
trait DemoStore {
    fn set(&self, key: &str, value: &'static str, ttl: Duration);
    fn get(&self, key: &str) -> Option<&'static str>;
    fn delete(&self, key: &str) -> bool;
    fn summary(&self) -> String;
    fn start_cleaner(&self, config: &StoreConfig) -> ttlstore::Result<CleanerHandle>;
}

impl DemoStore for Store<&'static str> {
    fn set(&self, key: &str, value: &'static str, ttl: Duration) {
        Store::set(self, key, value, ttl)
    }
    fn get(&self, key: &str) -> Option<&'static str> {
        Store::get(self, key)
    }
    fn delete(&self, key: &str) -> bool {
        Store::delete(self, key)
    }
    fn summary(&self) -> String {
        self.metrics().snapshot().summary()
    }
    fn start_cleaner(&self, config: &StoreConfig) -> ttlstore::Result<CleanerHandle> {
        TtlCleaner::from_config(self.clone(), config)?.spawn()
    }
}

impl DemoStore for ConcurrentStore<&'static str> {
    fn set(&self, key: &str, value: &'static str, ttl: Duration) {
        ConcurrentStore::set(self, key, value, ttl)
    }
    fn get(&self, key: &str) -> Option<&'static str> {
        ConcurrentStore::get(self, key)
    }
    fn delete(&self, key: &str) -> bool {
        ConcurrentStore::delete(self, key)
    }
    fn summary(&self) -> String {
        self.metrics().snapshot().summary()
    }
    fn start_cleaner(&self, config: &StoreConfig) -> ttlstore::Result<CleanerHandle> {
        TtlCleaner::from_config(self.clone(), config)?.spawn()
    }
}

async fn walkthrough<S: DemoStore>(
    store: S,
    args: &Args,
    config: &StoreConfig,
) -> anyhow::Result<()> {
    let cleaner = match args.sweep_interval_secs {
        Some(_) => Some(store.start_cleaner(config)?),
        None => None,
    };

    store.set("key1", "value1", Duration::from_secs(args.ttl_secs));
    store.set("key2", "value2", Duration::ZERO);

    info!(value = ?store.get("key1"), "Get key1");
    info!(value = ?store.get("key2"), "Get key2");

    info!("Waiting {}s for key1 to expire", args.wait_secs);
    tokio::time::sleep(Duration::from_secs(args.wait_secs)).await;

    info!(value = ?store.get("key1"), "Get key1 after expiration");

    store.delete("key2");
    info!(value = ?store.get("key2"), "Get key2 after deletion");

    if let Some(cleaner) = cleaner {
        cleaner.shutdown().await;
    }
    info!("{}", store.summary());
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("ttlstore=info".parse()?))
        .init();

    let args = Args::parse();

    let mut config = StoreConfig::default();
    if let Some(secs) = args.sweep_interval_secs {
        config = config.with_sweep_interval(Duration::from_secs(secs));
    }
    config.validate()?;

    if args.concurrent {
        info!(
            "Running demo on sharded store with {} shards",
            config.effective_shard_amount()
        );
        let store = ConcurrentStore::<&'static str>::with_config(&config)?;
        walkthrough(store, &args, &config).await
    } else {
        info!("Running demo on single-lock store");
        walkthrough(Store::<&'static str>::with_config(&config), &args, &config).await
    }
}
