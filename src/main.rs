use clap::Parser;
use coupon_ledger::application::engine::RedemptionEngine;
use coupon_ledger::application::ledger::LedgerStore;
use coupon_ledger::config::{DEFAULT_REWARD_PER_WORKOUT, EngineConfig};
use coupon_ledger::domain::ports::{DocumentStoreBox, LocalCacheBox};
use coupon_ledger::infrastructure::in_memory::{InMemoryCache, InMemoryDocumentStore};
use coupon_ledger::infrastructure::offline::OfflineDocumentStore;
use coupon_ledger::interfaces::csv::command_reader::CommandReader;
use coupon_ledger::interfaces::csv::coupon_writer::CouponWriter;
use coupon_ledger::logging;
use miette::{IntoDiagnostic, Result};
use std::fs::File;
use std::io;
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input commands CSV file (type, kind, coupon, amount)
    input: PathBuf,

    /// Path to a persistent database standing in for the shared remote store.
    #[arg(long)]
    remote_db: Option<PathBuf>,

    /// Path to the persistent device-local cache.
    #[arg(long)]
    cache_db: Option<PathBuf>,

    /// Treat the remote store as unreachable.
    #[arg(long)]
    offline: bool,

    /// Reward added to a streak coupon per completed workout.
    #[arg(long, default_value_t = DEFAULT_REWARD_PER_WORKOUT)]
    reward_per_workout: u64,

    /// Also print every coupon's history.
    #[arg(long)]
    history: bool,
}

#[cfg(feature = "storage-rocksdb")]
fn open_stores(cli: &Cli) -> Result<(DocumentStoreBox, LocalCacheBox)> {
    use coupon_ledger::error::LedgerError;
    use coupon_ledger::infrastructure::rocksdb::RocksDBStore;

    let open = |path: &PathBuf| {
        RocksDBStore::open(path)
            .map_err(LedgerError::from)
            .into_diagnostic()
    };
    let remote: DocumentStoreBox = match &cli.remote_db {
        Some(path) => Box::new(open(path)?),
        None => Box::new(InMemoryDocumentStore::new()),
    };
    let cache: LocalCacheBox = match &cli.cache_db {
        Some(path) => Box::new(open(path)?),
        None => Box::new(InMemoryCache::new()),
    };
    Ok((remote, cache))
}

#[cfg(not(feature = "storage-rocksdb"))]
fn open_stores(cli: &Cli) -> Result<(DocumentStoreBox, LocalCacheBox)> {
    if cli.remote_db.is_some() || cli.cache_db.is_some() {
        eprintln!(
            "WARNING: Persistent storage requested, but 'storage-rocksdb' feature is not enabled. Falling back to In-Memory storage."
        );
    }
    Ok((
        Box::new(InMemoryDocumentStore::new()),
        Box::new(InMemoryCache::new()),
    ))
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init_tracing();
    let cli = Cli::parse();

    let (remote, cache) = open_stores(&cli)?;
    let remote: DocumentStoreBox = if cli.offline {
        Box::new(OfflineDocumentStore)
    } else {
        remote
    };

    let engine = RedemptionEngine::with_config(
        LedgerStore::new(remote, cache),
        EngineConfig {
            reward_per_workout: cli.reward_per_workout,
        },
    );

    // Process commands
    let file = File::open(&cli.input).into_diagnostic()?;
    let reader = CommandReader::new(file);
    for command in reader.commands() {
        match command {
            Ok(command) => {
                if let Err(e) = command.execute(&engine).await {
                    eprintln!("Error processing command: {}", e);
                }
            }
            Err(e) => {
                eprintln!("Error reading command: {}", e);
            }
        }
    }

    let coupons = engine.into_results();

    let stdout = io::stdout();
    let mut writer = CouponWriter::new(stdout.lock());
    writer.write_coupons(&coupons).into_diagnostic()?;
    if cli.history {
        writer.write_history(&coupons).into_diagnostic()?;
    }

    Ok(())
}
