use crate::domain::coupon::CouponKind;
use thiserror::Error;

/// Reasons a caller's request is rejected. None of these change any state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RedemptionError {
    #[error("invalid amount: {0}")]
    InvalidAmount(String),
    #[error("insufficient balance: requested {requested}, available {available}")]
    InsufficientBalance { requested: u64, available: u64 },
    #[error("{operation} is not supported for {kind} coupons")]
    UnsupportedOperation {
        kind: CouponKind,
        operation: &'static str,
    },
}

/// Failures raised by the storage ports.
///
/// These are absorbed by the ledger adapter and turned into fallback data or
/// boolean sync flags; they are never returned by the engine.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("remote store unavailable: {0}")]
    RemoteUnavailable(String),
    #[error("document {collection}/{id} not found")]
    DocumentNotFound { collection: String, id: String },
    #[error("malformed document: {0}")]
    MalformedDocument(String),
    #[error("malformed local data under {key}: {reason}")]
    MalformedLocalData { key: String, reason: String },
    #[error("storage backend error: {0}")]
    Backend(String),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error(transparent)]
    Redemption(#[from] RedemptionError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, LedgerError>;
