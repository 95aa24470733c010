//! Patient DTOs.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Patient as returned by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub blood_type: Option<String>,
    #[serde(default)]
    pub emergency_contact: Option<String>,
    #[serde(default)]
    pub user_id: Option<i64>,
}

impl Patient {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// DTO for creating a patient.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePatient {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<String>,
    pub blood_type: Option<String>,
    pub emergency_contact: Option<String>,
}

/// DTO for updating a patient. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePatient {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blood_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emergency_contact: Option<String>,
}

impl CreatePatient {
    /// Check required fields before submission.
    pub fn validate(&self) -> crate::Result<()> {
        if self.first_name.trim().is_empty() || self.last_name.trim().is_empty() {
            return Err(crate::AppError::validation("First and last name are required"));
        }
        if !self.email.contains('@') {
            return Err(crate::AppError::validation("A valid email is required"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_minimal_patient() {
        let json = r#"{"id":1,"firstName":"Ada","lastName":"Lovelace","email":"ada@example.org"}"#;
        let patient: Patient = serde_json::from_str(json).unwrap();
        assert_eq!(patient.full_name(), "Ada Lovelace");
        assert!(patient.date_of_birth.is_none());
    }

    #[test]
    fn test_deserialize_date_of_birth() {
        let json = r#"{"id":2,"firstName":"A","lastName":"B","email":"a@b","dateOfBirth":"1990-04-12"}"#;
        let patient: Patient = serde_json::from_str(json).unwrap();
        assert_eq!(patient.date_of_birth, NaiveDate::from_ymd_opt(1990, 4, 12));
    }

    #[test]
    fn test_update_skips_absent_fields() {
        let update = UpdatePatient {
            phone_number: Some("555-0100".to_string()),
            ..Default::default()
        };
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json, serde_json::json!({"phoneNumber": "555-0100"}));
    }

    #[test]
    fn test_create_validation() {
        let mut data = CreatePatient {
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email: "ada@example.org".to_string(),
            ..Default::default()
        };
        assert!(data.validate().is_ok());

        data.email = "nope".to_string();
        assert!(data.validate().is_err());

        data.email = "ada@example.org".to_string();
        data.last_name = " ".to_string();
        assert!(data.validate().is_err());
    }
}
