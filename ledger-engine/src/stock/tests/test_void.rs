use super::*;
use shared::error::LedgerError;
use shared::models::{DispenseStatus, MovementType, PurchaseStatus};

#[test]
fn void_purchase_takes_untouched_stock_back_out() {
    let engine = test_engine();
    let item = seed_item(&engine, "Paracetamol 500mg");

    let purchase = engine
        .post_purchase(
            CLINIC,
            &pharmacist(),
            purchase_input(vec![purchase_line(item.id, "B-1", &day_offset(30), 10, 5.0)]),
        )
        .unwrap();
    assert_eq!(engine.on_hand(CLINIC, item.id).unwrap(), 10);

    let voided = engine
        .void_purchase(CLINIC, &pharmacist(), purchase.id, "wrong delivery")
        .unwrap();

    assert_eq!(voided.status, PurchaseStatus::Void);
    assert_eq!(voided.void_reason.as_deref(), Some("wrong delivery"));
    assert!(voided.voided_at.is_some());

    // Back to the pre-purchase value (0 for a fresh batch)
    assert_eq!(engine.on_hand(CLINIC, item.id).unwrap(), 0);

    let void_moves: Vec<_> = engine
        .list_movements(CLINIC, item.id)
        .unwrap()
        .into_iter()
        .filter(|m| m.movement_type == MovementType::Void)
        .collect();
    assert_eq!(void_moves.len(), 1);
    assert_eq!(void_moves[0].quantity, -10);
}

#[test]
fn void_purchase_fails_once_stock_was_consumed() {
    let engine = test_engine();
    let item = seed_item(&engine, "Amoxicillin 250mg");

    let purchase = engine
        .post_purchase(
            CLINIC,
            &pharmacist(),
            purchase_input(vec![purchase_line(item.id, "B-1", &day_offset(30), 10, 5.0)]),
        )
        .unwrap();
    engine
        .post_dispense(CLINIC, &pharmacist(), dispense_input(vec![(item.id, 4)]))
        .unwrap();

    let err = engine
        .void_purchase(CLINIC, &pharmacist(), purchase.id, "too late")
        .unwrap_err();
    assert!(matches!(err, LedgerError::CannotReverse { .. }));

    // Aborted without side effects
    assert_eq!(engine.on_hand(CLINIC, item.id).unwrap(), 6);
    let purchase = engine.get_purchase(CLINIC, purchase.id).unwrap().unwrap();
    assert_eq!(purchase.status, PurchaseStatus::Posted);
}

#[test]
fn voiding_twice_is_rejected() {
    let engine = test_engine();
    let item = seed_item(&engine, "Cetirizine 10mg");

    let purchase = engine
        .post_purchase(
            CLINIC,
            &pharmacist(),
            purchase_input(vec![purchase_line(item.id, "B-1", &day_offset(30), 5, 1.0)]),
        )
        .unwrap();
    engine.void_purchase(CLINIC, &pharmacist(), purchase.id, "dup").unwrap();

    let err = engine
        .void_purchase(CLINIC, &pharmacist(), purchase.id, "dup again")
        .unwrap_err();
    assert!(matches!(err, LedgerError::AlreadyVoid { .. }));

    let err = engine
        .void_purchase(CLINIC, &pharmacist(), 12345, "missing")
        .unwrap_err();
    assert!(matches!(err, LedgerError::NotFound { .. }));
}

#[test]
fn void_dispense_restores_every_batch_exactly() {
    let engine = test_engine();
    let item = seed_item(&engine, "Ibuprofen 400mg");

    engine
        .post_purchase(
            CLINIC,
            &pharmacist(),
            purchase_input(vec![
                purchase_line(item.id, "B-EARLY", &day_offset(30), 5, 2.0),
                purchase_line(item.id, "B-LATE", &day_offset(60), 10, 2.0),
            ]),
        )
        .unwrap();
    let before = engine.list_batches(CLINIC, item.id).unwrap();

    let dispense = engine
        .post_dispense(CLINIC, &pharmacist(), dispense_input(vec![(item.id, 8)]))
        .unwrap();
    assert_eq!(engine.on_hand(CLINIC, item.id).unwrap(), 7);

    let voided = engine
        .void_dispense(CLINIC, &pharmacist(), dispense.id, "patient returned")
        .unwrap();
    assert_eq!(voided.status, DispenseStatus::Void);

    // Every touched batch is back to its pre-dispense quantities,
    // qty_received untouched
    let after = engine.list_batches(CLINIC, item.id).unwrap();
    for b in &before {
        let restored = after.iter().find(|a| a.id == b.id).unwrap();
        assert_eq!(restored.qty_available, b.qty_available);
        assert_eq!(restored.qty_received, b.qty_received);
    }

    // Compensating movements mirror the consumption with positive signs
    let void_moves: Vec<_> = engine
        .list_movements(CLINIC, item.id)
        .unwrap()
        .into_iter()
        .filter(|m| m.movement_type == MovementType::Void)
        .collect();
    let mut restored: Vec<i64> = void_moves.iter().map(|m| m.quantity).collect();
    restored.sort();
    assert_eq!(restored, vec![3, 5]);
}

#[test]
fn void_dispense_twice_is_rejected() {
    let engine = test_engine();
    let item = seed_item(&engine, "Vitamin C");

    engine
        .post_purchase(
            CLINIC,
            &pharmacist(),
            purchase_input(vec![purchase_line(item.id, "B-1", &day_offset(30), 5, 1.0)]),
        )
        .unwrap();
    let dispense = engine
        .post_dispense(CLINIC, &pharmacist(), dispense_input(vec![(item.id, 2)]))
        .unwrap();

    engine
        .void_dispense(CLINIC, &pharmacist(), dispense.id, "entry error")
        .unwrap();
    let err = engine
        .void_dispense(CLINIC, &pharmacist(), dispense.id, "again")
        .unwrap_err();
    assert!(matches!(err, LedgerError::AlreadyVoid { .. }));
    assert_eq!(engine.on_hand(CLINIC, item.id).unwrap(), 5);
}

#[test]
fn voided_documents_leave_sequence_gaps() {
    let engine = test_engine();
    let item = seed_item(&engine, "ORS Sachet");

    let first = engine
        .post_purchase(
            CLINIC,
            &pharmacist(),
            purchase_input(vec![purchase_line(item.id, "B-1", &day_offset(30), 5, 1.0)]),
        )
        .unwrap();
    engine.void_purchase(CLINIC, &pharmacist(), first.id, "oops").unwrap();

    // The voided number is never reused
    let second = engine
        .post_purchase(
            CLINIC,
            &pharmacist(),
            purchase_input(vec![purchase_line(item.id, "B-2", &day_offset(30), 5, 1.0)]),
        )
        .unwrap();
    assert_eq!(first.purchase_no, "PO-000001");
    assert_eq!(second.purchase_no, "PO-000002");
}
