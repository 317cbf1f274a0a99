//! Patient models

use serde::{Deserialize, Serialize};

/// Patient record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patient {
    pub id: i64,
    pub full_name: String,
    pub phone: String,
    /// National identity card number
    pub nic: String,
    /// Human-facing code printed on the patient card
    pub patient_code: String,
    pub created_by: String,
    pub created_at: i64,
    pub updated_by: String,
    pub updated_at: i64,
}

/// Create patient payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientCreate {
    pub full_name: String,
    pub phone: String,
    pub nic: String,
    pub patient_code: String,
}

/// Update patient payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PatientUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nic: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patient_code: Option<String>,
}
