use chrono::{Duration, Local};
use shared::models::{
    Actor, DispenseInput, DispenseLineInput, PurchaseInput, PurchaseLineInput, StockItem,
    StockItemCreate,
};

use crate::LedgerEngine;

mod test_dispense;
mod test_void;

const CLINIC: &str = "clinic-main";

fn test_engine() -> LedgerEngine {
    LedgerEngine::open_in_memory().unwrap()
}

fn pharmacist() -> Actor {
    Actor::with_email("u-200", "pharmacy@clinic.test")
}

/// `YYYY-MM-DD` for today + `days` (negative for the past)
fn day_offset(days: i64) -> String {
    (Local::now().date_naive() + Duration::days(days))
        .format("%Y-%m-%d")
        .to_string()
}

fn seed_item(engine: &LedgerEngine, name: &str) -> StockItem {
    engine
        .create_stock_item(
            CLINIC,
            &pharmacist(),
            StockItemCreate {
                name: name.to_string(),
                sku: Some(format!("SKU-{name}")),
                unit: "tab".to_string(),
                sell_price: 15.0,
                reorder_level: 10,
                active: true,
            },
        )
        .unwrap()
}

fn purchase_line(
    item_id: i64,
    batch_no: &str,
    expiry: &str,
    qty: i64,
    unit_cost: f64,
) -> PurchaseLineInput {
    PurchaseLineInput {
        item_id,
        batch_no: batch_no.to_string(),
        expiry_date: expiry.to_string(),
        unit_cost,
        qty,
    }
}

fn purchase_input(lines: Vec<PurchaseLineInput>) -> PurchaseInput {
    PurchaseInput {
        supplier: Some("MediSupply Ltd".to_string()),
        purchase_date: day_offset(0),
        lines,
    }
}

fn dispense_input(lines: Vec<(i64, i64)>) -> DispenseInput {
    DispenseInput {
        patient_id: None,
        doctor_id: None,
        lines: lines
            .into_iter()
            .map(|(item_id, qty)| DispenseLineInput { item_id, qty })
            .collect(),
    }
}
