//! Domain models
//!
//! Typed records for everything the ledger engine persists, plus the
//! input payloads callers hand to it. All documents are tenant-scoped by
//! a clinic identifier the engine treats as an opaque partition key; the
//! key itself never appears inside the records.

pub mod actor;
pub mod catalog;
pub mod dispense;
pub mod invoice;
pub mod patient;
pub mod purchase;
pub mod schedule;
pub mod stock;
pub mod visit;

// Re-exports
pub use actor::Actor;
pub use catalog::{Service, ServiceInput};
pub use dispense::{BatchUsage, Dispense, DispenseInput, DispenseLine, DispenseLineInput, DispenseStatus};
pub use invoice::{
    Invoice, InvoiceInput, InvoiceItem, InvoiceItemInput, InvoiceStatus, Payment, PaymentInput,
    PaymentMethod,
};
pub use patient::{Patient, PatientCreate, PatientUpdate};
pub use purchase::{Purchase, PurchaseInput, PurchaseLine, PurchaseLineInput, PurchaseStatus};
pub use schedule::{
    Appointment, AppointmentInput, AppointmentStatus, QueueEntry, QueueSource, QueueStatus,
    QueueTokenInput,
};
pub use stock::{MovementRef, MovementType, StockBatch, StockItem, StockItemCreate, StockItemUpdate, StockMovement};
pub use visit::{PrescriptionLine, SourceRefType, Visit, VisitStatus, VisitUpdate};
