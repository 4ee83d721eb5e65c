#![allow(dead_code)]

use coupon_ledger::application::engine::RedemptionEngine;
use coupon_ledger::application::ledger::LedgerStore;
use coupon_ledger::infrastructure::in_memory::{InMemoryCache, InMemoryDocumentStore};
use std::io::{Error, Write};
use tempfile::NamedTempFile;

/// Writes a command file with the standard header followed by `rows`.
pub fn command_file(rows: &[&str]) -> Result<NamedTempFile, Error> {
    let mut file = NamedTempFile::new()?;
    writeln!(file, "type, kind, coupon, amount")?;
    for row in rows {
        writeln!(file, "{row}")?;
    }
    file.flush()?;
    Ok(file)
}

/// An engine over fresh in-memory stores, returning handles to both stores.
pub fn in_memory_engine() -> (RedemptionEngine, InMemoryDocumentStore, InMemoryCache) {
    let remote = InMemoryDocumentStore::new();
    let cache = InMemoryCache::new();
    let ledger = LedgerStore::new(Box::new(remote.clone()), Box::new(cache.clone()));
    (RedemptionEngine::new(ledger), remote, cache)
}
