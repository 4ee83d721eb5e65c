use crate::application::engine::CouponView;
use crate::domain::coupon::{CouponKind, CouponStatus};
use crate::domain::history::HistoryAction;
use crate::error::Result;
use serde::Serialize;
use std::io::Write;

const COUPON_HEADER: [&str; 6] = ["kind", "coupon", "balance", "status", "entries", "synced"];
const HISTORY_HEADER: [&str; 7] = [
    "kind",
    "coupon",
    "action",
    "amount",
    "resulting_balance",
    "date",
    "time",
];

#[derive(Serialize)]
struct CouponRow<'a> {
    kind: CouponKind,
    coupon: &'a str,
    balance: u64,
    status: CouponStatus,
    entries: usize,
    synced: bool,
}

#[derive(Serialize)]
struct HistoryRow<'a> {
    kind: CouponKind,
    coupon: &'a str,
    action: HistoryAction,
    amount: u64,
    resulting_balance: u64,
    date: &'a str,
    time: &'a str,
}

/// Writes coupon summaries and histories as CSV tables.
pub struct CouponWriter<W: Write> {
    out: W,
}

impl<W: Write> CouponWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// One row per coupon with its balance and sync state.
    pub fn write_coupons(&mut self, coupons: &[CouponView]) -> Result<()> {
        let mut wtr = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(&mut self.out);
        wtr.write_record(COUPON_HEADER)?;
        for view in coupons {
            wtr.serialize(CouponRow {
                kind: view.key.kind,
                coupon: &view.key.id,
                balance: view.balance,
                status: view.status,
                entries: view.history.len(),
                synced: view.remote_synced,
            })?;
        }
        wtr.flush()?;
        Ok(())
    }

    /// Every history entry, each coupon's entries most recent first, preceded
    /// by a blank separator line.
    pub fn write_history(&mut self, coupons: &[CouponView]) -> Result<()> {
        writeln!(self.out)?;
        let mut wtr = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(&mut self.out);
        wtr.write_record(HISTORY_HEADER)?;
        for view in coupons {
            for entry in &view.history {
                wtr.serialize(HistoryRow {
                    kind: view.key.kind,
                    coupon: &view.key.id,
                    action: entry.action,
                    amount: entry.amount,
                    resulting_balance: entry.resulting_balance,
                    date: &entry.date,
                    time: &entry.time,
                })?;
            }
        }
        wtr.flush()?;
        Ok(())
    }
}
