//! Sequence issuance and document numbering
//!
//! Counters are keyed `(clinic_id, name)` and incremented inside the
//! caller's write transaction, so the number and the document it stamps
//! commit or abort together. Daily queue counters carry the clinic-local
//! date in their name (`queue_2025-06-01`), which resets token sequences
//! at local midnight without ever resetting a stored value.

use redb::{ReadableTable, WriteTransaction};

use crate::storage::{COUNTERS, StorageResult};

/// Read-increment-write the named counter; returns the new value.
pub(crate) fn issue(txn: &WriteTransaction, clinic_id: &str, name: &str) -> StorageResult<u64> {
    let mut table = txn.open_table(COUNTERS)?;
    let current = table.get((clinic_id, name))?.map(|g| g.value()).unwrap_or(0);
    let next = current + 1;
    table.insert((clinic_id, name), next)?;
    Ok(next)
}

/// Render a human-facing document number: prefix + 6-digit zero-padded
/// value, e.g. `INV-000042`. The width and prefix match what printed
/// receipts and dispense slips already carry.
pub fn format_doc_no(prefix: &str, value: u64) -> String {
    format!("{prefix}-{value:06}")
}

/// Counter name for a clinic-local day's queue tokens
pub(crate) fn queue_counter_name(day_key: &str) -> String {
    format!("queue_{day_key}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doc_numbers_are_zero_padded_to_six() {
        assert_eq!(format_doc_no("INV", 1), "INV-000001");
        assert_eq!(format_doc_no("PO", 42), "PO-000042");
        assert_eq!(format_doc_no("DS", 999_999), "DS-999999");
        // Wider values keep all digits rather than truncating
        assert_eq!(format_doc_no("INV", 1_234_567), "INV-1234567");
    }

    #[test]
    fn queue_counters_are_per_day() {
        assert_eq!(queue_counter_name("2025-06-01"), "queue_2025-06-01");
        assert_ne!(queue_counter_name("2025-06-01"), queue_counter_name("2025-06-02"));
    }
}
