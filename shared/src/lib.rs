//! Shared types for the clinic ledger
//!
//! Domain models, the error taxonomy and small utilities used by the
//! ledger engine and by anything embedding it (server endpoints, tools).

pub mod error;
pub mod models;
pub mod util;

// Re-exports
pub use error::{LedgerError, LedgerResult};
pub use serde::{Deserialize, Serialize};
