//! Domain layer: coupon records, history entries and the storage ports the
//! application layer depends on.

pub mod amount;
pub mod coupon;
pub mod history;
pub mod ports;
