//! Queue and appointment models (排队/预约)
//!
//! Both status enums progress forward only under normal flow, with side
//! exits (`skipped`, `cancelled`) reachable from early states only. The
//! transition tables here are the single source of truth — the engine
//! rejects anything they do not allow, instead of trusting callers.

use serde::{Deserialize, Serialize};

/// Walk-in queue status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueStatus {
    Waiting,
    InConsult,
    Done,
    Skipped,
}

impl QueueStatus {
    /// Transition table: `waiting -> in_consult -> done`, side exit
    /// `waiting -> skipped`.
    pub fn can_transition(self, next: QueueStatus) -> bool {
        use QueueStatus::*;
        matches!(
            (self, next),
            (Waiting, InConsult) | (Waiting, Skipped) | (InConsult, Done)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, QueueStatus::Done | QueueStatus::Skipped)
    }
}

/// How the queue entry was created
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueSource {
    Walkin,
    Patient,
}

/// Walk-in queue entry
///
/// `token_number = N` proves that N-1 tokens were issued that clinic-day
/// before it, even if some are later skipped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueEntry {
    pub id: i64,
    pub token_number: u64,
    /// Clinic-local `YYYY-MM-DD` day the token belongs to
    pub date: String,
    pub patient_id: Option<i64>,
    pub patient_name: Option<String>,
    pub phone: Option<String>,
    pub doctor_id: i64,
    pub doctor_name: String,
    pub source: QueueSource,
    pub status: QueueStatus,
    pub created_by: String,
    pub created_at: i64,
    pub updated_by: String,
    pub updated_at: i64,
}

/// Add queue token payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueTokenInput {
    pub doctor_id: i64,
    pub doctor_name: String,
    pub patient_id: Option<i64>,
    pub patient_name: Option<String>,
    pub phone: Option<String>,
    /// Defaults to `patient` when a patient ID is supplied, else `walkin`
    pub source: Option<QueueSource>,
}

/// Appointment status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Booked,
    Arrived,
    InConsult,
    Completed,
    Cancelled,
}

impl AppointmentStatus {
    /// Transition table: `booked -> arrived -> in_consult -> completed`,
    /// with `booked -> in_consult` as the start-consult shortcut and
    /// `cancelled` reachable only before the consult begins.
    pub fn can_transition(self, next: AppointmentStatus) -> bool {
        use AppointmentStatus::*;
        matches!(
            (self, next),
            (Booked, Arrived)
                | (Booked, InConsult)
                | (Booked, Cancelled)
                | (Arrived, InConsult)
                | (Arrived, Cancelled)
                | (InConsult, Completed)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, AppointmentStatus::Completed | AppointmentStatus::Cancelled)
    }
}

/// Appointment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: i64,
    pub patient_id: Option<i64>,
    pub patient_name: String,
    pub doctor_id: i64,
    pub doctor_name: String,
    /// `YYYY-MM-DD`
    pub date: String,
    /// Free-form slot label, e.g. "09:30"
    pub time: Option<String>,
    pub status: AppointmentStatus,
    pub created_by: String,
    pub created_at: i64,
    pub updated_by: String,
    pub updated_at: i64,
}

/// Create appointment payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentInput {
    pub patient_id: Option<i64>,
    pub patient_name: String,
    pub doctor_id: i64,
    pub doctor_name: String,
    /// `YYYY-MM-DD`; rejected if not a well-formed calendar date
    pub date: String,
    pub time: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queue_flow_is_forward_only() {
        use QueueStatus::*;
        assert!(Waiting.can_transition(InConsult));
        assert!(InConsult.can_transition(Done));
        assert!(Waiting.can_transition(Skipped));

        assert!(!InConsult.can_transition(Waiting));
        assert!(!Done.can_transition(InConsult));
        assert!(!Done.can_transition(Waiting));
        assert!(!InConsult.can_transition(Skipped));
        assert!(!Skipped.can_transition(InConsult));
    }

    #[test]
    fn appointment_side_exits_only_before_consult() {
        use AppointmentStatus::*;
        assert!(Booked.can_transition(Arrived));
        assert!(Booked.can_transition(InConsult));
        assert!(Arrived.can_transition(Cancelled));
        assert!(InConsult.can_transition(Completed));

        assert!(!InConsult.can_transition(Cancelled));
        assert!(!Completed.can_transition(Booked));
        assert!(!Cancelled.can_transition(Booked));
    }
}
