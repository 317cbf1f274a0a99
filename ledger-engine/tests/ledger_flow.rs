//! End-to-end flows over a single engine: the paths the front desk,
//! doctor and pharmacy actually exercise in one clinic day, plus
//! persistence and concurrency checks that need a real database file.

use chrono::{Duration, Local};
use ledger_engine::LedgerEngine;
use ledger_engine::models::{
    Actor, DispenseInput, DispenseLineInput, InvoiceInput, InvoiceItemInput, PaymentInput,
    PaymentMethod, PurchaseInput, PurchaseLineInput, QueueStatus, QueueTokenInput, StockItemCreate,
    VisitStatus, VisitUpdate,
};

const CLINIC: &str = "clinic-main";

fn actor() -> Actor {
    Actor::with_email("u-100", "reception@clinic.test")
}

fn day_offset(days: i64) -> String {
    (Local::now().date_naive() + Duration::days(days))
        .format("%Y-%m-%d")
        .to_string()
}

fn seed_item(engine: &LedgerEngine, name: &str) -> i64 {
    engine
        .create_stock_item(
            CLINIC,
            &actor(),
            StockItemCreate {
                name: name.to_string(),
                sku: None,
                unit: "tab".to_string(),
                sell_price: 15.0,
                reorder_level: 10,
                active: true,
            },
        )
        .unwrap()
        .id
}

fn receive_stock(engine: &LedgerEngine, item_id: i64, qty: i64) -> i64 {
    engine
        .post_purchase(
            CLINIC,
            &actor(),
            PurchaseInput {
                supplier: Some("MediSupply Ltd".to_string()),
                purchase_date: day_offset(0),
                lines: vec![PurchaseLineInput {
                    item_id,
                    batch_no: "B-1".to_string(),
                    expiry_date: day_offset(180),
                    unit_cost: 2.0,
                    qty,
                }],
            },
        )
        .unwrap()
        .id
}

#[test]
fn one_clinic_day_from_token_to_reversal() {
    let engine = LedgerEngine::open_in_memory().unwrap();
    let item_id = seed_item(&engine, "Paracetamol 500mg");
    let purchase_id = receive_stock(&engine, item_id, 30);

    // Reception: walk-in token
    let entry = engine
        .add_queue_token(
            CLINIC,
            &actor(),
            QueueTokenInput {
                doctor_id: 7,
                doctor_name: "Dr. Silva".to_string(),
                patient_id: None,
                patient_name: Some("K. Fernando".to_string()),
                phone: None,
                source: None,
            },
        )
        .unwrap();
    assert_eq!(entry.token_number, 1);

    // Doctor: consult, prescribe, close
    let visit = engine.create_visit_from_queue(CLINIC, &actor(), entry.id).unwrap();
    engine
        .update_visit(
            CLINIC,
            &actor(),
            visit.id,
            VisitUpdate {
                diagnosis: Some("Viral fever".to_string()),
                ..Default::default()
            },
        )
        .unwrap();
    let closed = engine.close_visit(CLINIC, &actor(), visit.id).unwrap();
    assert_eq!(closed.status, VisitStatus::Closed);
    let entry = engine.get_queue_entry(CLINIC, entry.id).unwrap().unwrap();
    assert_eq!(entry.status, QueueStatus::Done);

    // Billing: invoice + payment
    let invoice = engine
        .create_invoice(
            CLINIC,
            &actor(),
            InvoiceInput {
                patient_id: None,
                patient_name: "K. Fernando".to_string(),
                doctor_id: Some(7),
                doctor_name: Some("Dr. Silva".to_string()),
                items: vec![InvoiceItemInput {
                    service_id: None,
                    name: "General Consultation".to_string(),
                    qty: 1,
                    unit_price: 3000.0,
                }],
                discount: 500.0,
            },
        )
        .unwrap();
    assert_eq!(invoice.invoice_number, "INV-000001");
    assert_eq!(invoice.total, 2500.0);
    engine
        .record_payment(
            CLINIC,
            &actor(),
            PaymentInput {
                invoice_id: invoice.id,
                amount: 2500.0,
                method: PaymentMethod::Cash,
                note: None,
            },
        )
        .unwrap();

    // Pharmacy: dispense, then the whole chain reversed
    let dispense = engine
        .post_dispense(
            CLINIC,
            &actor(),
            DispenseInput {
                patient_id: None,
                doctor_id: Some(7),
                lines: vec![DispenseLineInput { item_id, qty: 15 }],
            },
        )
        .unwrap();
    assert_eq!(engine.on_hand(CLINIC, item_id).unwrap(), 15);

    engine
        .void_dispense(CLINIC, &actor(), dispense.id, "patient returned")
        .unwrap();
    assert_eq!(engine.on_hand(CLINIC, item_id).unwrap(), 30);

    // With the dispense reversed the purchase can be reversed too
    engine
        .void_purchase(CLINIC, &actor(), purchase_id, "supplier recall")
        .unwrap();
    assert_eq!(engine.on_hand(CLINIC, item_id).unwrap(), 0);

    // Each document stream numbered independently
    assert_eq!(engine.current_sequence(CLINIC, "invoices").unwrap(), 1);
    assert_eq!(engine.current_sequence(CLINIC, "purchases").unwrap(), 1);
    assert_eq!(engine.current_sequence(CLINIC, "dispenses").unwrap(), 1);
}

#[test]
fn reopening_the_database_preserves_counters_and_stock() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("clinic.redb");

    let item_id;
    {
        let engine = LedgerEngine::open(&path).unwrap();
        item_id = seed_item(&engine, "Amoxicillin 250mg");
        receive_stock(&engine, item_id, 20);
        let invoice = engine
            .create_invoice(
                CLINIC,
                &actor(),
                InvoiceInput {
                    patient_id: None,
                    patient_name: "W. Perera".to_string(),
                    doctor_id: None,
                    doctor_name: None,
                    items: vec![InvoiceItemInput {
                        service_id: None,
                        name: "General Consultation".to_string(),
                        qty: 1,
                        unit_price: 3000.0,
                    }],
                    discount: 0.0,
                },
            )
            .unwrap();
        assert_eq!(invoice.invoice_number, "INV-000001");
    }

    let engine = LedgerEngine::open(&path).unwrap();
    assert_eq!(engine.on_hand(CLINIC, item_id).unwrap(), 20);
    assert_eq!(engine.list_batches(CLINIC, item_id).unwrap().len(), 1);

    // Counters continue where they left off
    let invoice = engine
        .create_invoice(
            CLINIC,
            &actor(),
            InvoiceInput {
                patient_id: None,
                patient_name: "W. Perera".to_string(),
                doctor_id: None,
                doctor_name: None,
                items: vec![InvoiceItemInput {
                    service_id: None,
                    name: "Follow-up Consultation".to_string(),
                    qty: 1,
                    unit_price: 2000.0,
                }],
                discount: 0.0,
            },
        )
        .unwrap();
    assert_eq!(invoice.invoice_number, "INV-000002");
}

#[test]
fn concurrent_token_issuance_is_dense_and_duplicate_free() {
    const WORKSTATIONS: usize = 4;
    const TOKENS_EACH: usize = 10;

    let engine = LedgerEngine::open_in_memory().unwrap();

    let mut handles = Vec::new();
    for i in 0..WORKSTATIONS {
        let engine = engine.clone();
        handles.push(std::thread::spawn(move || {
            let staff = Actor::new(format!("u-{i}"));
            let mut tokens = Vec::with_capacity(TOKENS_EACH);
            for _ in 0..TOKENS_EACH {
                let entry = engine
                    .add_queue_token(
                        CLINIC,
                        &staff,
                        QueueTokenInput {
                            doctor_id: 7,
                            doctor_name: "Dr. Silva".to_string(),
                            patient_id: None,
                            patient_name: None,
                            phone: None,
                            source: None,
                        },
                    )
                    .unwrap();
                tokens.push(entry.token_number);
            }
            tokens
        }));
    }

    let mut all: Vec<u64> = handles
        .into_iter()
        .flat_map(|h| h.join().unwrap())
        .collect();
    all.sort();

    // Exactly 1..=N: no duplicates, no gaps
    let expected: Vec<u64> = (1..=(WORKSTATIONS * TOKENS_EACH) as u64).collect();
    assert_eq!(all, expected);
}
