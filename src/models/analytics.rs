//! Medical records, diagnoses and reports served under the analytics API.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// A visit record written by a doctor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicalRecord {
    pub id: i64,
    pub patient_id: i64,
    #[serde(default)]
    pub doctor_id: Option<i64>,
    #[serde(default)]
    pub visit_date: Option<NaiveDate>,
    #[serde(default)]
    pub chief_complaint: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub treatment: Option<String>,
}

/// DTO for creating or replacing a medical record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMedicalRecord {
    pub patient_id: i64,
    pub doctor_id: Option<i64>,
    pub visit_date: Option<NaiveDate>,
    pub chief_complaint: Option<String>,
    pub notes: Option<String>,
    pub treatment: Option<String>,
}

/// A diagnosis attached to a patient and optionally a record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnosis {
    pub id: i64,
    pub patient_id: i64,
    #[serde(default)]
    pub medical_record_id: Option<i64>,
    #[serde(default)]
    pub doctor_id: Option<i64>,
    #[serde(default)]
    pub code: Option<String>,
    pub description: String,
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default)]
    pub diagnosed_at: Option<NaiveDateTime>,
}

/// DTO for creating or replacing a diagnosis.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDiagnosis {
    pub patient_id: i64,
    pub medical_record_id: Option<i64>,
    pub doctor_id: Option<i64>,
    pub code: Option<String>,
    pub description: String,
    pub severity: Option<String>,
}

/// A radiology report. `report_content` is free text that is often JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub id: i64,
    pub patient_id: i64,
    #[serde(default)]
    pub image_id: Option<i64>,
    #[serde(default)]
    pub radiologist_id: Option<i64>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub report_content: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
}

/// DTO for creating or replacing a report.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReport {
    pub patient_id: i64,
    pub image_id: Option<i64>,
    pub radiologist_id: Option<i64>,
    pub title: Option<String>,
    pub report_content: String,
    pub status: Option<String>,
}

impl CreateDiagnosis {
    pub fn validate(&self) -> crate::Result<()> {
        if self.description.trim().is_empty() {
            return Err(crate::AppError::validation("Diagnosis description is required"));
        }
        Ok(())
    }
}

impl CreateReport {
    pub fn validate(&self) -> crate::Result<()> {
        if self.report_content.trim().is_empty() {
            return Err(crate::AppError::validation("Report content is required"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_without_content_defaults_empty() {
        let report: Report = serde_json::from_str(r#"{"id":1,"patientId":2}"#).unwrap();
        assert_eq!(report.report_content, "");
    }

    #[test]
    fn test_diagnosis_timestamp() {
        let json = r#"{"id":1,"patientId":2,"description":"Fracture","diagnosedAt":"2024-03-01T09:30:00"}"#;
        let d: Diagnosis = serde_json::from_str(json).unwrap();
        assert_eq!(d.diagnosed_at.unwrap().to_string(), "2024-03-01 09:30:00");
    }

    #[test]
    fn test_validation() {
        let d = CreateDiagnosis {
            patient_id: 1,
            description: "  ".to_string(),
            ..Default::default()
        };
        assert!(d.validate().is_err());

        let r = CreateReport {
            patient_id: 1,
            report_content: "{\"findings\":\"none\"}".to_string(),
            ..Default::default()
        };
        assert!(r.validate().is_ok());
    }
}
