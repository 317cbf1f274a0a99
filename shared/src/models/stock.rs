//! Stock models (库存)
//!
//! A `StockItem` is a sellable/dispensable product type; a `StockBatch`
//! is one received lot of it with its own expiry and available quantity.
//! On-hand quantity of an item is always derived as the sum of its
//! batches' `qty_available` — it is never stored on the item, so item and
//! batch records cannot drift apart.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Stock item (product type)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockItem {
    pub id: i64,
    pub name: String,
    pub sku: Option<String>,
    /// Dispensing unit, e.g. "tab", "ml", "bottle"
    pub unit: String,
    pub sell_price: f64,
    /// Low-stock threshold for reorder views
    pub reorder_level: i64,
    pub active: bool,
    pub created_by: String,
    pub created_at: i64,
    pub updated_by: String,
    pub updated_at: i64,
}

/// Create stock item payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockItemCreate {
    pub name: String,
    pub sku: Option<String>,
    pub unit: String,
    pub sell_price: f64,
    pub reorder_level: i64,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

/// Update stock item payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StockItemUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sell_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reorder_level: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
}

/// Stock batch (received lot)
///
/// Logical identity is the composite `(item_id, batch_no, expiry_date)`:
/// receiving the same batch/expiry again increments the existing record
/// instead of creating a duplicate.
///
/// Invariant: `0 <= qty_available <= qty_received` at all times.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockBatch {
    pub id: i64,
    pub item_id: i64,
    pub batch_no: String,
    pub expiry_date: NaiveDate,
    pub unit_cost: f64,
    pub qty_received: i64,
    pub qty_available: i64,
    /// Purchase that first created this batch
    pub purchase_id: Option<i64>,
    pub supplier: Option<String>,
    pub created_by: String,
    pub created_at: i64,
    pub updated_at: i64,
}

impl StockBatch {
    /// Composite-key match used for purchase upserts and voids
    pub fn matches_key(&self, item_id: i64, batch_no: &str, expiry_date: NaiveDate) -> bool {
        self.item_id == item_id && self.batch_no == batch_no && self.expiry_date == expiry_date
    }
}

/// Movement type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementType {
    Purchase,
    Dispense,
    Void,
}

/// Which document a movement references
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementRef {
    Purchase,
    Dispense,
}

/// Stock movement (不可变流水)
///
/// Immutable, append-only. One row per batch touched by any
/// stock-affecting operation; every batch's `qty_available` is
/// reconstructable from its movement history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockMovement {
    pub id: i64,
    pub movement_type: MovementType,
    pub item_id: i64,
    pub batch_id: i64,
    /// Signed: positive adds stock, negative removes it
    pub quantity: i64,
    pub unit_cost: f64,
    pub ref_type: MovementRef,
    pub ref_id: i64,
    pub created_by: String,
    pub created_at: i64,
}
