//! Stock ledger operations
//!
//! Posting and voiding mutate batches and append movements inside one
//! write transaction per operation; a failed precondition aborts the
//! whole transaction, so stock is never partially dispensed or partially
//! restored.

use chrono::Local;
use serde_json::json;
use shared::error::{LedgerError, LedgerResult};
use shared::models::{
    Actor, BatchUsage, Dispense, DispenseInput, DispenseLine, DispenseStatus, MovementRef,
    MovementType, Purchase, PurchaseInput, PurchaseLine, PurchaseStatus, StockBatch, StockItem,
    StockItemCreate, StockItemUpdate, StockMovement,
};
use shared::util;

use crate::audit::AuditAction;
use crate::engine::{LedgerEngine, parse_date};
use crate::money;
use crate::sequence;
use crate::storage::{
    self, DISPENSES, PURCHASES, STOCK_BATCHES, STOCK_ITEMS, STOCK_MOVEMENTS,
};

impl LedgerEngine {
    // ========== Stock item admin ==========

    /// Create a stock item
    pub fn create_stock_item(
        &self,
        clinic_id: &str,
        actor: &Actor,
        input: StockItemCreate,
    ) -> LedgerResult<StockItem> {
        if input.name.trim().is_empty() {
            return Err(LedgerError::invalid_input("stock item name must not be empty"));
        }
        money::require_non_negative(input.sell_price, "sell_price")?;
        if input.reorder_level < 0 {
            return Err(LedgerError::invalid_input("reorder_level must be non-negative"));
        }

        let now = util::now_millis();
        let item = StockItem {
            id: util::snowflake_id(),
            name: input.name,
            sku: input.sku,
            unit: input.unit,
            sell_price: input.sell_price,
            reorder_level: input.reorder_level,
            active: input.active,
            created_by: actor.uid.clone(),
            created_at: now,
            updated_by: actor.uid.clone(),
            updated_at: now,
        };

        let txn = self.storage().begin_write()?;
        storage::put_doc(&txn, STOCK_ITEMS, clinic_id, item.id, &item)?;
        storage::commit(txn)?;

        self.audit_log(
            clinic_id,
            actor,
            AuditAction::StockItemCreated,
            "stock_item",
            item.id,
            json!({ "name": item.name }),
        );
        Ok(item)
    }

    /// Update a stock item's editable fields
    pub fn update_stock_item(
        &self,
        clinic_id: &str,
        actor: &Actor,
        item_id: i64,
        patch: StockItemUpdate,
    ) -> LedgerResult<StockItem> {
        if let Some(price) = patch.sell_price {
            money::require_non_negative(price, "sell_price")?;
        }

        let txn = self.storage().begin_write()?;
        let mut item: StockItem = storage::get_doc(&txn, STOCK_ITEMS, clinic_id, item_id)?
            .ok_or_else(|| LedgerError::not_found(format!("stock item {item_id}")))?;

        if let Some(name) = patch.name {
            if name.trim().is_empty() {
                return Err(LedgerError::invalid_input("stock item name must not be empty"));
            }
            item.name = name;
        }
        if let Some(sku) = patch.sku {
            item.sku = Some(sku);
        }
        if let Some(unit) = patch.unit {
            item.unit = unit;
        }
        if let Some(price) = patch.sell_price {
            item.sell_price = price;
        }
        if let Some(level) = patch.reorder_level {
            if level < 0 {
                return Err(LedgerError::invalid_input("reorder_level must be non-negative"));
            }
            item.reorder_level = level;
        }
        if let Some(active) = patch.active {
            item.active = active;
        }
        item.updated_by = actor.uid.clone();
        item.updated_at = util::now_millis();

        storage::put_doc(&txn, STOCK_ITEMS, clinic_id, item.id, &item)?;
        storage::commit(txn)?;

        self.audit_log(
            clinic_id,
            actor,
            AuditAction::StockItemUpdated,
            "stock_item",
            item.id,
            json!({ "name": item.name }),
        );
        Ok(item)
    }

    pub fn get_stock_item(&self, clinic_id: &str, item_id: i64) -> LedgerResult<Option<StockItem>> {
        Ok(self.storage().read_doc(STOCK_ITEMS, clinic_id, item_id)?)
    }

    pub fn list_stock_items(&self, clinic_id: &str) -> LedgerResult<Vec<StockItem>> {
        Ok(self.storage().scan_docs(STOCK_ITEMS, clinic_id)?)
    }

    // ========== Derived quantities ==========

    /// On-hand quantity of an item: the sum of its batches' available
    /// quantity. Always recomputed from batches — dispense checks,
    /// low-stock views and dashboards all go through here.
    pub fn on_hand(&self, clinic_id: &str, item_id: i64) -> LedgerResult<i64> {
        let batches: Vec<StockBatch> = self.storage().scan_docs(STOCK_BATCHES, clinic_id)?;
        Ok(batches
            .iter()
            .filter(|b| b.item_id == item_id)
            .map(|b| b.qty_available)
            .sum())
    }

    /// Active items whose on-hand quantity is at or below their reorder
    /// level, with the on-hand value
    pub fn low_stock_items(&self, clinic_id: &str) -> LedgerResult<Vec<(StockItem, i64)>> {
        let batches: Vec<StockBatch> = self.storage().scan_docs(STOCK_BATCHES, clinic_id)?;
        let items: Vec<StockItem> = self.storage().scan_docs(STOCK_ITEMS, clinic_id)?;

        let mut low = Vec::new();
        for item in items.into_iter().filter(|i| i.active) {
            let on_hand: i64 = batches
                .iter()
                .filter(|b| b.item_id == item.id)
                .map(|b| b.qty_available)
                .sum();
            if on_hand <= item.reorder_level {
                low.push((item, on_hand));
            }
        }
        Ok(low)
    }

    pub fn get_stock_batch(&self, clinic_id: &str, batch_id: i64) -> LedgerResult<Option<StockBatch>> {
        Ok(self.storage().read_doc(STOCK_BATCHES, clinic_id, batch_id)?)
    }

    /// All batches of an item, in creation order
    pub fn list_batches(&self, clinic_id: &str, item_id: i64) -> LedgerResult<Vec<StockBatch>> {
        let batches: Vec<StockBatch> = self.storage().scan_docs(STOCK_BATCHES, clinic_id)?;
        Ok(batches.into_iter().filter(|b| b.item_id == item_id).collect())
    }

    /// Movement trail of an item, in append order
    pub fn list_movements(&self, clinic_id: &str, item_id: i64) -> LedgerResult<Vec<StockMovement>> {
        let movements: Vec<StockMovement> = self.storage().scan_docs(STOCK_MOVEMENTS, clinic_id)?;
        Ok(movements.into_iter().filter(|m| m.item_id == item_id).collect())
    }

    // ========== FEFO planning ==========

    /// Plan a FEFO allocation without writing anything.
    ///
    /// Soonest-expiring valid batches first; expired stock is never
    /// auto-allocated. Used both for UI preview and as the pre-flight
    /// step of [`Self::post_dispense`].
    pub fn plan_fefo(
        &self,
        clinic_id: &str,
        item_id: i64,
        qty: i64,
    ) -> LedgerResult<Vec<BatchUsage>> {
        if qty < 1 {
            return Err(LedgerError::invalid_input(format!(
                "requested quantity must be at least 1, got {qty}"
            )));
        }
        let item: StockItem = self
            .get_stock_item(clinic_id, item_id)?
            .ok_or_else(|| LedgerError::not_found(format!("stock item {item_id}")))?;
        let batches = self.list_batches(clinic_id, item_id)?;
        let today = Local::now().date_naive();
        super::fefo::plan(&batches, qty, today).map_err(|s| insufficient(item_id, &item.name, s))
    }

    // ========== Posting ==========

    /// Post a purchase: upsert target batches, append movements, number
    /// and write the purchase document — all in one transaction.
    ///
    /// Batches are keyed `(item_id, batch_no, expiry_date)`: re-running
    /// with identical batch keys increments the existing batch rather
    /// than duplicating it, which is how partial receipts get corrected.
    pub fn post_purchase(
        &self,
        clinic_id: &str,
        actor: &Actor,
        input: PurchaseInput,
    ) -> LedgerResult<Purchase> {
        let purchase_date = parse_date(&input.purchase_date, "purchase_date")?;
        if input.lines.is_empty() {
            return Err(LedgerError::invalid_input("purchase must contain at least one line"));
        }
        let mut parsed = Vec::with_capacity(input.lines.len());
        for line in &input.lines {
            if line.qty < 1 {
                return Err(LedgerError::invalid_input(format!(
                    "line quantity must be at least 1, got {}",
                    line.qty
                )));
            }
            money::require_non_negative(line.unit_cost, "unit_cost")?;
            if line.batch_no.trim().is_empty() {
                return Err(LedgerError::invalid_input("batch_no must not be empty"));
            }
            let expiry = parse_date(&line.expiry_date, "expiry_date")?;
            parsed.push((line, expiry));
        }

        let now = util::now_millis();
        let purchase_id = util::snowflake_id();

        let txn = self.storage().begin_write()?;
        let seq = sequence::issue(&txn, clinic_id, "purchases")?;
        let purchase_no = sequence::format_doc_no("PO", seq);

        let mut lines = Vec::with_capacity(parsed.len());
        for (line, expiry) in parsed {
            let item: StockItem = storage::get_doc(&txn, STOCK_ITEMS, clinic_id, line.item_id)?
                .ok_or_else(|| LedgerError::not_found(format!("stock item {}", line.item_id)))?;

            // Upsert by composite key
            let existing = storage::scan_docs_txn::<StockBatch>(&txn, STOCK_BATCHES, clinic_id)?
                .into_iter()
                .find(|b| b.matches_key(line.item_id, &line.batch_no, expiry));
            let batch_id = match existing {
                Some(mut batch) => {
                    batch.qty_received += line.qty;
                    batch.qty_available += line.qty;
                    batch.updated_at = now;
                    storage::put_doc(&txn, STOCK_BATCHES, clinic_id, batch.id, &batch)?;
                    batch.id
                }
                None => {
                    let batch = StockBatch {
                        id: util::snowflake_id(),
                        item_id: line.item_id,
                        batch_no: line.batch_no.clone(),
                        expiry_date: expiry,
                        unit_cost: line.unit_cost,
                        qty_received: line.qty,
                        qty_available: line.qty,
                        purchase_id: Some(purchase_id),
                        supplier: input.supplier.clone(),
                        created_by: actor.uid.clone(),
                        created_at: now,
                        updated_at: now,
                    };
                    storage::put_doc(&txn, STOCK_BATCHES, clinic_id, batch.id, &batch)?;
                    batch.id
                }
            };

            let movement = StockMovement {
                id: util::snowflake_id(),
                movement_type: MovementType::Purchase,
                item_id: line.item_id,
                batch_id,
                quantity: line.qty,
                unit_cost: line.unit_cost,
                ref_type: MovementRef::Purchase,
                ref_id: purchase_id,
                created_by: actor.uid.clone(),
                created_at: now,
            };
            storage::put_doc(&txn, STOCK_MOVEMENTS, clinic_id, movement.id, &movement)?;

            lines.push(PurchaseLine {
                item_id: line.item_id,
                item_name: item.name,
                batch_no: line.batch_no.clone(),
                expiry_date: expiry,
                unit_cost: line.unit_cost,
                qty: line.qty,
                line_cost: money::line_total(line.qty, line.unit_cost),
            });
        }

        let total_cost = money::sum(lines.iter().map(|l| l.line_cost));
        let purchase = Purchase {
            id: purchase_id,
            purchase_no,
            supplier: input.supplier,
            purchase_date,
            lines,
            total_cost,
            status: PurchaseStatus::Posted,
            created_by: actor.uid.clone(),
            created_at: now,
            void_reason: None,
            voided_by: None,
            voided_at: None,
        };
        storage::put_doc(&txn, PURCHASES, clinic_id, purchase_id, &purchase)?;
        storage::commit(txn)?;

        tracing::info!(
            purchase_no = %purchase.purchase_no,
            total_cost = purchase.total_cost,
            lines = purchase.lines.len(),
            "Purchase posted"
        );
        self.audit_log(
            clinic_id,
            actor,
            AuditAction::PurchasePosted,
            "purchase",
            purchase_id,
            json!({ "purchase_no": purchase.purchase_no, "total_cost": purchase.total_cost }),
        );
        Ok(purchase)
    }

    /// Post a dispense: FEFO-plan each line outside the transaction,
    /// re-validate every planned batch inside it, decrement, append
    /// movements and freeze the allocation into the document.
    ///
    /// The in-transaction re-check closes the race window between
    /// planning (UI preview time) and posting: if another workstation
    /// drained a planned batch meanwhile, the whole dispense fails with
    /// `InsufficientStock` rather than partially posting.
    pub fn post_dispense(
        &self,
        clinic_id: &str,
        actor: &Actor,
        input: DispenseInput,
    ) -> LedgerResult<Dispense> {
        if input.lines.is_empty() {
            return Err(LedgerError::invalid_input("dispense must contain at least one line"));
        }
        for line in &input.lines {
            if line.qty < 1 {
                return Err(LedgerError::invalid_input(format!(
                    "line quantity must be at least 1, got {}",
                    line.qty
                )));
            }
        }

        // Pre-flight plan per line
        let today = Local::now().date_naive();
        let mut planned = Vec::with_capacity(input.lines.len());
        for line in &input.lines {
            let item: StockItem = self
                .get_stock_item(clinic_id, line.item_id)?
                .ok_or_else(|| LedgerError::not_found(format!("stock item {}", line.item_id)))?;
            let batches = self.list_batches(clinic_id, line.item_id)?;
            let usages = super::fefo::plan(&batches, line.qty, today)
                .map_err(|s| insufficient(line.item_id, &item.name, s))?;
            planned.push((line.item_id, item.name, line.qty, usages));
        }

        let now = util::now_millis();
        let dispense_id = util::snowflake_id();

        let txn = self.storage().begin_write()?;
        let seq = sequence::issue(&txn, clinic_id, "dispenses")?;
        let dispense_no = sequence::format_doc_no("DS", seq);

        let mut lines = Vec::with_capacity(planned.len());
        for (item_id, item_name, qty, usages) in planned {
            for usage in &usages {
                let mut batch: StockBatch =
                    storage::get_doc(&txn, STOCK_BATCHES, clinic_id, usage.batch_id)?
                        .ok_or_else(|| {
                            LedgerError::not_found(format!("stock batch {}", usage.batch_no))
                        })?;
                // Commit-time re-check of the plan
                if batch.qty_available < usage.qty {
                    return Err(LedgerError::InsufficientStock {
                        item_id,
                        requested: usage.qty,
                        available: batch.qty_available,
                        message: format!(
                            "stock for {item_name} changed while posting: batch {} has {} unit(s) left, needed {}",
                            batch.batch_no, batch.qty_available, usage.qty
                        ),
                    });
                }
                batch.qty_available -= usage.qty;
                batch.updated_at = now;
                storage::put_doc(&txn, STOCK_BATCHES, clinic_id, batch.id, &batch)?;

                let movement = StockMovement {
                    id: util::snowflake_id(),
                    movement_type: MovementType::Dispense,
                    item_id,
                    batch_id: usage.batch_id,
                    quantity: -usage.qty,
                    unit_cost: usage.unit_cost,
                    ref_type: MovementRef::Dispense,
                    ref_id: dispense_id,
                    created_by: actor.uid.clone(),
                    created_at: now,
                };
                storage::put_doc(&txn, STOCK_MOVEMENTS, clinic_id, movement.id, &movement)?;
            }

            let cost_total = money::sum(usages.iter().map(|u| money::line_total(u.qty, u.unit_cost)));
            lines.push(DispenseLine {
                item_id,
                item_name,
                qty,
                batches_used: usages,
                cost_total,
            });
        }

        let total_cost = money::sum(lines.iter().map(|l| l.cost_total));
        let dispense = Dispense {
            id: dispense_id,
            dispense_no,
            patient_id: input.patient_id,
            doctor_id: input.doctor_id,
            dispense_date: today,
            lines,
            total_cost,
            status: DispenseStatus::Posted,
            created_by: actor.uid.clone(),
            created_at: now,
            void_reason: None,
            voided_by: None,
            voided_at: None,
        };
        storage::put_doc(&txn, DISPENSES, clinic_id, dispense_id, &dispense)?;
        storage::commit(txn)?;

        tracing::info!(
            dispense_no = %dispense.dispense_no,
            total_cost = dispense.total_cost,
            lines = dispense.lines.len(),
            "Dispense posted"
        );
        self.audit_log(
            clinic_id,
            actor,
            AuditAction::DispensePosted,
            "dispense",
            dispense_id,
            json!({ "dispense_no": dispense.dispense_no, "total_cost": dispense.total_cost }),
        );
        Ok(dispense)
    }

    // ========== Voiding ==========

    /// Void a posted purchase, taking the received stock back out.
    ///
    /// All-or-nothing: every line's batch must still hold at least the
    /// received quantity. If any of it was already consumed the whole
    /// void fails with `CannotReverse`.
    pub fn void_purchase(
        &self,
        clinic_id: &str,
        actor: &Actor,
        purchase_id: i64,
        reason: &str,
    ) -> LedgerResult<Purchase> {
        let now = util::now_millis();

        let txn = self.storage().begin_write()?;
        let mut purchase: Purchase = storage::get_doc(&txn, PURCHASES, clinic_id, purchase_id)?
            .ok_or_else(|| LedgerError::not_found(format!("purchase {purchase_id}")))?;
        if purchase.status == PurchaseStatus::Void {
            return Err(LedgerError::already_void(format!("purchase {}", purchase.purchase_no)));
        }

        for line in &purchase.lines {
            let mut batch = storage::scan_docs_txn::<StockBatch>(&txn, STOCK_BATCHES, clinic_id)?
                .into_iter()
                .find(|b| b.matches_key(line.item_id, &line.batch_no, line.expiry_date))
                .ok_or_else(|| {
                    LedgerError::cannot_reverse(format!(
                        "batch {} (expiry {}) no longer exists",
                        line.batch_no, line.expiry_date
                    ))
                })?;
            // Received stock must still be on the shelf. Lines hitting
            // the same batch are checked against the running balance.
            if batch.qty_available < line.qty {
                return Err(LedgerError::cannot_reverse(format!(
                    "batch {} has {} unit(s) available but {} were received; stock already consumed",
                    batch.batch_no, batch.qty_available, line.qty
                )));
            }
            batch.qty_available -= line.qty;
            batch.updated_at = now;
            storage::put_doc(&txn, STOCK_BATCHES, clinic_id, batch.id, &batch)?;

            let movement = StockMovement {
                id: util::snowflake_id(),
                movement_type: MovementType::Void,
                item_id: line.item_id,
                batch_id: batch.id,
                quantity: -line.qty,
                unit_cost: line.unit_cost,
                ref_type: MovementRef::Purchase,
                ref_id: purchase_id,
                created_by: actor.uid.clone(),
                created_at: now,
            };
            storage::put_doc(&txn, STOCK_MOVEMENTS, clinic_id, movement.id, &movement)?;
        }

        purchase.status = PurchaseStatus::Void;
        purchase.void_reason = Some(reason.to_string());
        purchase.voided_by = Some(actor.uid.clone());
        purchase.voided_at = Some(now);
        storage::put_doc(&txn, PURCHASES, clinic_id, purchase_id, &purchase)?;
        storage::commit(txn)?;

        tracing::info!(purchase_no = %purchase.purchase_no, reason, "Purchase voided");
        self.audit_log(
            clinic_id,
            actor,
            AuditAction::PurchaseVoided,
            "purchase",
            purchase_id,
            json!({ "purchase_no": purchase.purchase_no, "reason": reason }),
        );
        Ok(purchase)
    }

    /// Void a posted dispense, restoring exactly the stock it consumed.
    ///
    /// The frozen `batches_used` allocation drives the reversal, so each
    /// touched batch gets back precisely what was taken from it. Putting
    /// stock back cannot fail an availability check, but a missing batch
    /// is a data-integrity violation and aborts the whole void.
    pub fn void_dispense(
        &self,
        clinic_id: &str,
        actor: &Actor,
        dispense_id: i64,
        reason: &str,
    ) -> LedgerResult<Dispense> {
        let now = util::now_millis();

        let txn = self.storage().begin_write()?;
        let mut dispense: Dispense = storage::get_doc(&txn, DISPENSES, clinic_id, dispense_id)?
            .ok_or_else(|| LedgerError::not_found(format!("dispense {dispense_id}")))?;
        if dispense.status == DispenseStatus::Void {
            return Err(LedgerError::already_void(format!("dispense {}", dispense.dispense_no)));
        }

        for line in &dispense.lines {
            for usage in &line.batches_used {
                let mut batch: StockBatch =
                    storage::get_doc(&txn, STOCK_BATCHES, clinic_id, usage.batch_id)?
                        .ok_or_else(|| {
                            LedgerError::not_found(format!(
                                "stock batch {} referenced by {}",
                                usage.batch_no, dispense.dispense_no
                            ))
                        })?;
                batch.qty_available += usage.qty;
                batch.updated_at = now;
                storage::put_doc(&txn, STOCK_BATCHES, clinic_id, batch.id, &batch)?;

                let movement = StockMovement {
                    id: util::snowflake_id(),
                    movement_type: MovementType::Void,
                    item_id: line.item_id,
                    batch_id: usage.batch_id,
                    quantity: usage.qty,
                    unit_cost: usage.unit_cost,
                    ref_type: MovementRef::Dispense,
                    ref_id: dispense_id,
                    created_by: actor.uid.clone(),
                    created_at: now,
                };
                storage::put_doc(&txn, STOCK_MOVEMENTS, clinic_id, movement.id, &movement)?;
            }
        }

        dispense.status = DispenseStatus::Void;
        dispense.void_reason = Some(reason.to_string());
        dispense.voided_by = Some(actor.uid.clone());
        dispense.voided_at = Some(now);
        storage::put_doc(&txn, DISPENSES, clinic_id, dispense_id, &dispense)?;
        storage::commit(txn)?;

        tracing::info!(dispense_no = %dispense.dispense_no, reason, "Dispense voided");
        self.audit_log(
            clinic_id,
            actor,
            AuditAction::DispenseVoided,
            "dispense",
            dispense_id,
            json!({ "dispense_no": dispense.dispense_no, "reason": reason }),
        );
        Ok(dispense)
    }

    pub fn get_purchase(&self, clinic_id: &str, purchase_id: i64) -> LedgerResult<Option<Purchase>> {
        Ok(self.storage().read_doc(PURCHASES, clinic_id, purchase_id)?)
    }

    pub fn get_dispense(&self, clinic_id: &str, dispense_id: i64) -> LedgerResult<Option<Dispense>> {
        Ok(self.storage().read_doc(DISPENSES, clinic_id, dispense_id)?)
    }
}

/// Map a planner shortfall onto the operation error
fn insufficient(item_id: i64, item_name: &str, shortfall: super::fefo::Shortfall) -> LedgerError {
    LedgerError::InsufficientStock {
        item_id,
        requested: shortfall.requested,
        available: shortfall.available,
        message: shortfall.message(item_name),
    }
}
