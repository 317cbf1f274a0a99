//! Purchase models (入库)

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Purchase status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PurchaseStatus {
    Posted,
    Void,
}

/// One received line of a purchase
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseLine {
    pub item_id: i64,
    /// Item name frozen at post time
    pub item_name: String,
    pub batch_no: String,
    pub expiry_date: NaiveDate,
    pub unit_cost: f64,
    pub qty: i64,
    pub line_cost: f64,
}

/// Purchase document
///
/// Immutable once posted except for the void fields; a void is a
/// compensating transition, never a delete.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Purchase {
    pub id: i64,
    /// `PO-000001` style document number
    pub purchase_no: String,
    pub supplier: Option<String>,
    pub purchase_date: NaiveDate,
    pub lines: Vec<PurchaseLine>,
    pub total_cost: f64,
    pub status: PurchaseStatus,
    pub created_by: String,
    pub created_at: i64,
    pub void_reason: Option<String>,
    pub voided_by: Option<String>,
    pub voided_at: Option<i64>,
}

/// Post purchase payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseInput {
    pub supplier: Option<String>,
    /// `YYYY-MM-DD`; rejected if not a well-formed calendar date
    pub purchase_date: String,
    pub lines: Vec<PurchaseLineInput>,
}

/// One line of a purchase payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseLineInput {
    pub item_id: i64,
    pub batch_no: String,
    /// `YYYY-MM-DD`; rejected if not a well-formed calendar date
    pub expiry_date: String,
    pub unit_cost: f64,
    pub qty: i64,
}
