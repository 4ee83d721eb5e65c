//! Application layer containing the core ledger orchestration.
//!
//! `LedgerStore` keeps the remote document store and the local cache in step
//! and absorbs every remote failure. `RedemptionEngine` validates requests
//! against the session's view of each coupon and persists the outcome through
//! the ledger.

pub mod engine;
pub mod ledger;
