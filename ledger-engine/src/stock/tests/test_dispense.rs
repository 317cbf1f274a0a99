use super::*;
use shared::error::LedgerError;
use shared::models::{DispenseStatus, MovementType};

#[test]
fn dispense_allocates_soonest_expiry_first_and_splits_batches() {
    let engine = test_engine();
    let item = seed_item(&engine, "Paracetamol 500mg");

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

    let dispense = engine
        .post_dispense(CLINIC, &pharmacist(), dispense_input(vec![(item.id, 8)]))
        .unwrap();

    assert_eq!(dispense.dispense_no, "DS-000001");
    assert_eq!(dispense.status, DispenseStatus::Posted);
    assert_eq!(dispense.lines.len(), 1);

    let used = &dispense.lines[0].batches_used;
    assert_eq!(used.len(), 2);
    assert_eq!((used[0].batch_no.as_str(), used[0].qty), ("B-EARLY", 5));
    assert_eq!((used[1].batch_no.as_str(), used[1].qty), ("B-LATE", 3));

    assert_eq!(engine.on_hand(CLINIC, item.id).unwrap(), 7);
    let batches = engine.list_batches(CLINIC, item.id).unwrap();
    let early = batches.iter().find(|b| b.batch_no == "B-EARLY").unwrap();
    let late = batches.iter().find(|b| b.batch_no == "B-LATE").unwrap();
    assert_eq!(early.qty_available, 0);
    assert_eq!(late.qty_available, 7);

    let dispense_moves: Vec<_> = engine
        .list_movements(CLINIC, item.id)
        .unwrap()
        .into_iter()
        .filter(|m| m.movement_type == MovementType::Dispense)
        .collect();
    assert_eq!(dispense_moves.len(), 2);
    assert!(dispense_moves.iter().all(|m| m.quantity < 0));
}

#[test]
fn plan_fefo_is_a_plan_not_a_commitment() {
    let engine = test_engine();
    let item = seed_item(&engine, "Amoxicillin 250mg");

    engine
        .post_purchase(
            CLINIC,
            &pharmacist(),
            purchase_input(vec![purchase_line(item.id, "B-1", &day_offset(30), 10, 1.0)]),
        )
        .unwrap();

    let plan = engine.plan_fefo(CLINIC, item.id, 6).unwrap();
    assert_eq!(plan.len(), 1);
    assert_eq!(plan[0].qty, 6);

    // Nothing moved, no number was issued
    assert_eq!(engine.on_hand(CLINIC, item.id).unwrap(), 10);
    assert_eq!(engine.current_sequence(CLINIC, "dispenses").unwrap(), 0);
}

#[test]
fn insufficient_stock_fails_the_whole_dispense_without_mutation() {
    let engine = test_engine();
    let item = seed_item(&engine, "Cetirizine 10mg");

    engine
        .post_purchase(
            CLINIC,
            &pharmacist(),
            purchase_input(vec![
                purchase_line(item.id, "B-1", &day_offset(30), 2, 1.0),
                purchase_line(item.id, "B-2", &day_offset(60), 1, 1.0),
            ]),
        )
        .unwrap();

    let err = engine
        .post_dispense(CLINIC, &pharmacist(), dispense_input(vec![(item.id, 5)]))
        .unwrap_err();
    match err {
        LedgerError::InsufficientStock { requested, available, .. } => {
            assert_eq!(requested, 5);
            assert_eq!(available, 3);
        }
        other => panic!("expected InsufficientStock, got {other:?}"),
    }

    // No batch mutated, no dispense document created, no number burned
    assert_eq!(engine.on_hand(CLINIC, item.id).unwrap(), 3);
    assert_eq!(engine.current_sequence(CLINIC, "dispenses").unwrap(), 0);
    assert!(
        engine
            .list_movements(CLINIC, item.id)
            .unwrap()
            .iter()
            .all(|m| m.movement_type == MovementType::Purchase)
    );
}

#[test]
fn expired_stock_is_never_dispensed() {
    let engine = test_engine();
    let item = seed_item(&engine, "Ibuprofen 400mg");

    engine
        .post_purchase(
            CLINIC,
            &pharmacist(),
            purchase_input(vec![
                purchase_line(item.id, "B-EXPIRED", &day_offset(-10), 50, 1.0),
                purchase_line(item.id, "B-VALID", &day_offset(30), 3, 1.0),
            ]),
        )
        .unwrap();

    // Only the valid batch is allocatable
    let dispense = engine
        .post_dispense(CLINIC, &pharmacist(), dispense_input(vec![(item.id, 3)]))
        .unwrap();
    assert_eq!(dispense.lines[0].batches_used.len(), 1);
    assert_eq!(dispense.lines[0].batches_used[0].batch_no, "B-VALID");

    // The expired 50 units never count towards availability
    let err = engine.plan_fefo(CLINIC, item.id, 1).unwrap_err();
    match err {
        LedgerError::InsufficientStock { available, message, .. } => {
            assert_eq!(available, 0);
            assert!(message.contains("expired"));
        }
        other => panic!("expected InsufficientStock, got {other:?}"),
    }
}

#[test]
fn multi_line_dispense_freezes_costs_per_line() {
    let engine = test_engine();
    let tablets = seed_item(&engine, "Paracetamol 500mg");
    let syrup = seed_item(&engine, "Cough Syrup 100ml");

    engine
        .post_purchase(
            CLINIC,
            &pharmacist(),
            purchase_input(vec![
                purchase_line(tablets.id, "B-T", &day_offset(30), 20, 2.0),
                purchase_line(syrup.id, "B-S", &day_offset(30), 5, 150.0),
            ]),
        )
        .unwrap();

    let dispense = engine
        .post_dispense(
            CLINIC,
            &pharmacist(),
            dispense_input(vec![(tablets.id, 10), (syrup.id, 1)]),
        )
        .unwrap();

    assert_eq!(dispense.lines.len(), 2);
    assert_eq!(dispense.lines[0].cost_total, 20.0);
    assert_eq!(dispense.lines[1].cost_total, 150.0);
    assert_eq!(dispense.total_cost, 170.0);
}

#[test]
fn dispense_rejects_bad_input() {
    let engine = test_engine();
    let item = seed_item(&engine, "Vitamin C");

    let err = engine
        .post_dispense(CLINIC, &pharmacist(), dispense_input(vec![]))
        .unwrap_err();
    assert!(matches!(err, LedgerError::InvalidInput { .. }));

    let err = engine
        .post_dispense(CLINIC, &pharmacist(), dispense_input(vec![(item.id, 0)]))
        .unwrap_err();
    assert!(matches!(err, LedgerError::InvalidInput { .. }));

    let err = engine
        .post_dispense(CLINIC, &pharmacist(), dispense_input(vec![(999, 1)]))
        .unwrap_err();
    assert!(matches!(err, LedgerError::NotFound { .. }));
}
