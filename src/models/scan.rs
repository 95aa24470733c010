//! Scan appointment DTOs and the status buttons offered per role.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::routing::Role;

/// Radiology workflow status. Transitions are validated by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScanStatus {
    #[default]
    Requested,
    Scheduled,
    InProgress,
    Completed,
    Cancelled,
    Rejected,
}

impl ScanStatus {
    pub const ALL: [ScanStatus; 6] = [
        ScanStatus::Requested,
        ScanStatus::Scheduled,
        ScanStatus::InProgress,
        ScanStatus::Completed,
        ScanStatus::Cancelled,
        ScanStatus::Rejected,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ScanStatus::Requested => "Requested",
            ScanStatus::Scheduled => "Scheduled",
            ScanStatus::InProgress => "In Progress",
            ScanStatus::Completed => "Completed",
            ScanStatus::Cancelled => "Cancelled",
            ScanStatus::Rejected => "Rejected",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ScanStatus::Completed | ScanStatus::Cancelled | ScanStatus::Rejected)
    }

    /// Statuses offered as buttons to `role`. Not a guarantee the backend accepts them.
    pub fn next_statuses(&self, role: Role) -> &'static [ScanStatus] {
        use ScanStatus::*;

        match role {
            Role::Radiologist | Role::Admin => match self {
                Requested => &[Scheduled, Rejected],
                Scheduled => &[InProgress, Cancelled],
                InProgress => &[Completed, Cancelled],
                Completed | Cancelled | Rejected => &[],
            },
            Role::Doctor => match self {
                Requested | Scheduled => &[Cancelled],
                _ => &[],
            },
            Role::Patient => &[],
        }
    }
}

/// Urgency set by the requesting doctor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
    Urgent,
}

impl Priority {
    pub const ALL: [Priority; 4] = [Priority::Low, Priority::Normal, Priority::High, Priority::Urgent];

    pub fn label(&self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Normal => "Normal",
            Priority::High => "High",
            Priority::Urgent => "Urgent",
        }
    }
}

/// Scan appointment as returned by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanAppointment {
    pub id: i64,
    pub patient_id: i64,
    #[serde(default)]
    pub doctor_id: Option<i64>,
    #[serde(default)]
    pub radiologist_id: Option<i64>,
    pub scan_type: String,
    #[serde(default)]
    pub body_part: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub status: ScanStatus,
    #[serde(default)]
    pub requested_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub scheduled_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// DTO for requesting a new scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateScanAppointment {
    pub patient_id: i64,
    pub doctor_id: Option<i64>,
    pub scan_type: String,
    pub body_part: Option<String>,
    pub reason: String,
    pub priority: Priority,
}

/// Generic update used for every status change and assignment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateScanAppointment {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ScanStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub radiologist_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_at: Option<NaiveDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl UpdateScanAppointment {
    pub fn status(status: ScanStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_wire_format() {
        assert_eq!(serde_json::to_string(&ScanStatus::InProgress).unwrap(), "\"IN_PROGRESS\"");
        let s: ScanStatus = serde_json::from_str("\"REJECTED\"").unwrap();
        assert_eq!(s, ScanStatus::Rejected);
    }

    #[test]
    fn test_radiologist_buttons() {
        assert_eq!(
            ScanStatus::Requested.next_statuses(Role::Radiologist),
            &[ScanStatus::Scheduled, ScanStatus::Rejected]
        );
        assert_eq!(
            ScanStatus::InProgress.next_statuses(Role::Radiologist),
            &[ScanStatus::Completed, ScanStatus::Cancelled]
        );
    }

    #[test]
    fn test_terminal_statuses_offer_nothing() {
        for status in ScanStatus::ALL.iter().filter(|s| s.is_terminal()) {
            for role in [Role::Patient, Role::Doctor, Role::Radiologist, Role::Admin] {
                assert!(status.next_statuses(role).is_empty());
            }
        }
    }

    #[test]
    fn test_doctor_and_patient_buttons() {
        assert_eq!(ScanStatus::Scheduled.next_statuses(Role::Doctor), &[ScanStatus::Cancelled]);
        assert!(ScanStatus::InProgress.next_statuses(Role::Doctor).is_empty());
        assert!(ScanStatus::Requested.next_statuses(Role::Patient).is_empty());
    }

    #[test]
    fn test_status_update_body() {
        let body = serde_json::to_value(UpdateScanAppointment::status(ScanStatus::Scheduled)).unwrap();
        assert_eq!(body, serde_json::json!({"status": "SCHEDULED"}));
    }

    #[test]
    fn test_deserialize_appointment_defaults() {
        let json = r#"{"id":3,"patientId":1,"scanType":"MRI"}"#;
        let appt: ScanAppointment = serde_json::from_str(json).unwrap();
        assert_eq!(appt.status, ScanStatus::Requested);
        assert_eq!(appt.priority, Priority::Normal);
        assert!(appt.radiologist_id.is_none());
    }
}
