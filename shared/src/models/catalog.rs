//! Billing service catalog

use serde::{Deserialize, Serialize};

/// Billable service (consultation fee etc.)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Service {
    pub id: i64,
    pub name: String,
    pub amount: f64,
    pub active: bool,
    pub created_by: String,
    pub created_at: i64,
}

/// Create service payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceInput {
    pub name: String,
    pub amount: f64,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}
