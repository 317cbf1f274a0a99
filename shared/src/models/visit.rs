//! Visit (consultation) models

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Visit status — `open` while the doctor is consulting, `closed` is
/// terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisitStatus {
    Open,
    Closed,
}

/// Which record a visit was started from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceRefType {
    Queue,
    Appointment,
}

/// One prescribed line, as entered by the doctor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrescriptionLine {
    pub name: String,
    pub dose: Option<String>,
    pub qty: Option<i64>,
    pub note: Option<String>,
}

/// Visit (consultation session)
///
/// Links exactly one origin (queue entry or appointment) to the clinical
/// output. At most one open visit may exist per origin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Visit {
    pub id: i64,
    pub patient_id: Option<i64>,
    pub patient_name: String,
    pub phone: Option<String>,
    pub nic: Option<String>,
    pub doctor_id: i64,
    pub doctor_name: String,
    pub source_ref_type: SourceRefType,
    pub source_ref_id: i64,
    pub status: VisitStatus,
    pub diagnosis: String,
    pub notes: String,
    pub prescription: Vec<PrescriptionLine>,
    pub follow_up_date: Option<NaiveDate>,
    pub created_by: String,
    pub created_at: i64,
    pub updated_by: String,
    pub updated_at: i64,
}

/// Clinical-field patch, applicable only while the visit is open
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VisitUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnosis: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prescription: Option<Vec<PrescriptionLine>>,
    /// `YYYY-MM-DD`; rejected if not a well-formed calendar date
    #[serde(skip_serializing_if = "Option::is_none")]
    pub follow_up_date: Option<String>,
}
