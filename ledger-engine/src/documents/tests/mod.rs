use shared::models::{Actor, InvoiceInput, InvoiceItemInput};

use crate::LedgerEngine;


const CLINIC: &str = "clinic-main";

fn test_engine() -> LedgerEngine {
    LedgerEngine::open_in_memory().unwrap()
}

fn reception() -> Actor {
    Actor::with_email("u-100", "reception@clinic.test")
}

fn invoice_item(name: &str, qty: i64, unit_price: f64) -> InvoiceItemInput {
    InvoiceItemInput {
        service_id: None,
        name: name.to_string(),
        qty,
        unit_price,
    }
}

fn invoice_input(items: Vec<InvoiceItemInput>, discount: f64) -> InvoiceInput {
    InvoiceInput {
        patient_id: None,
        patient_name: "W. Perera".to_string(),
        doctor_id: None,
        doctor_name: Some("Dr. Silva".to_string()),
        items,
        discount,
    }
}
