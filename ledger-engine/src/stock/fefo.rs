//! First-Expiring-First-Out allocation planning
//!
//! Pure functions over in-memory batch lists: no storage access, no
//! writes. The engine plans before entering a write transaction (so the
//! UI can preview an allocation) and re-validates each planned batch
//! inside the transaction at post time.

use chrono::NaiveDate;
use shared::models::{BatchUsage, StockBatch};

/// Why a plan could not be fully satisfied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shortfall {
    pub requested: i64,
    /// Valid (non-expired) stock that was allocatable
    pub available: i64,
    /// Stock on hand that was excluded because it is past expiry
    pub expired: i64,
}

impl Shortfall {
    /// Human-readable reason; expired-only stock reads differently from
    /// an empty shelf, but both are the same failure kind.
    pub fn message(&self, item_name: &str) -> String {
        if self.available == 0 && self.expired > 0 {
            format!(
                "no valid stock for {item_name}: {} unit(s) on hand are expired",
                self.expired
            )
        } else if self.available == 0 {
            format!("no stock on hand for {item_name}")
        } else {
            format!(
                "insufficient stock for {item_name}: requested {}, available {}",
                self.requested, self.available
            )
        }
    }
}

/// Plan a FEFO allocation of `requested` units across `batches`.
///
/// Eligible batches (available quantity, not expired as of `today`) are
/// consumed soonest-expiry-first; same-expiry batches go oldest received
/// first. The returned list is a plan, not a commitment — nothing is
/// written.
pub fn plan(
    batches: &[StockBatch],
    requested: i64,
    today: NaiveDate,
) -> Result<Vec<BatchUsage>, Shortfall> {
    let mut eligible: Vec<&StockBatch> = batches
        .iter()
        .filter(|b| b.qty_available > 0 && b.expiry_date >= today)
        .collect();
    eligible.sort_by(|a, b| {
        a.expiry_date
            .cmp(&b.expiry_date)
            .then(a.created_at.cmp(&b.created_at))
            .then(a.id.cmp(&b.id))
    });

    let mut need = requested;
    let mut usages = Vec::new();
    for batch in eligible {
        if need == 0 {
            break;
        }
        let take = batch.qty_available.min(need);
        usages.push(BatchUsage {
            batch_id: batch.id,
            batch_no: batch.batch_no.clone(),
            expiry_date: batch.expiry_date,
            qty: take,
            unit_cost: batch.unit_cost,
        });
        need -= take;
    }

    if need > 0 {
        let expired = batches
            .iter()
            .filter(|b| b.qty_available > 0 && b.expiry_date < today)
            .map(|b| b.qty_available)
            .sum();
        return Err(Shortfall {
            requested,
            available: requested - need,
            expired,
        });
    }
    Ok(usages)
}
