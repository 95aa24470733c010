//! Form state for dialogs, and conversion into request DTOs.
//!
//! Conversion validates input so a bad form never reaches the backend.

use std::path::PathBuf;

use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime};

use crate::error::{AppError, Result};
use crate::models::{
    CreateCharge, CreateDiagnosis, CreateMedicalRecord, CreateMedicalStaff, CreatePatient, CreateReport,
    CreateScanAppointment, ImageUpload, MedicalStaff, Patient, Priority, ScanStatus, UpdateMedicalStaff,
    UpdatePatient, UpdateScanAppointment,
};
use crate::routing::Role;

/// Parse date input flexibly, accepting multiple formats.
pub fn parse_flexible_date(input: &str) -> Option<NaiveDate> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    for fmt in &["%Y-%m-%d", "%Y/%m/%d", "%Y.%m.%d", "%d/%m/%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(input, fmt) {
            return Some(date);
        }
    }
    None
}

/// Trimmed text, or `None` when blank.
fn optional(text: &str) -> Option<String> {
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

fn required(text: &str, what: &str) -> Result<String> {
    optional(text).ok_or_else(|| AppError::validation(format!("{what} is required")))
}

fn optional_date(input: &str) -> Result<Option<NaiveDate>> {
    if input.trim().is_empty() {
        return Ok(None);
    }
    parse_flexible_date(input)
        .map(Some)
        .ok_or_else(|| AppError::validation("Invalid date format (use YYYY-MM-DD)"))
}

#[derive(Debug, Default, Clone)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    pub error: Option<String>,
    pub in_progress: bool,
}

impl LoginForm {
    pub fn validate(&self) -> Result<()> {
        if self.username.trim().is_empty() || self.password.is_empty() {
            return Err(AppError::validation("Username and password are required"));
        }
        Ok(())
    }
}

/// Form state for patient CRUD.
#[derive(Debug, Default, Clone)]
pub struct PatientForm {
    pub id: Option<i64>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
    pub address: String,
    pub date_of_birth_input: String,
    pub gender: Option<String>,
    pub blood_type: String,
    pub emergency_contact: String,
    pub is_open: bool,
    pub is_editing: bool,
}

impl PatientForm {
    /// Reset the form to default values.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn open_new() -> Self {
        Self {
            is_open: true,
            ..Default::default()
        }
    }

    /// Create a form pre-filled for editing an existing patient.
    pub fn edit(patient: &Patient) -> Self {
        Self {
            id: Some(patient.id),
            first_name: patient.first_name.clone(),
            last_name: patient.last_name.clone(),
            email: patient.email.clone(),
            phone_number: patient.phone_number.clone().unwrap_or_default(),
            address: patient.address.clone().unwrap_or_default(),
            date_of_birth_input: patient.date_of_birth.map(|d| d.to_string()).unwrap_or_default(),
            gender: patient.gender.clone(),
            blood_type: patient.blood_type.clone().unwrap_or_default(),
            emergency_contact: patient.emergency_contact.clone().unwrap_or_default(),
            is_open: true,
            is_editing: true,
        }
    }

    pub fn to_create(&self) -> Result<CreatePatient> {
        let data = CreatePatient {
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            email: self.email.trim().to_string(),
            phone_number: optional(&self.phone_number),
            address: optional(&self.address),
            date_of_birth: optional_date(&self.date_of_birth_input)?,
            gender: self.gender.clone(),
            blood_type: optional(&self.blood_type),
            emergency_contact: optional(&self.emergency_contact),
        };
        data.validate()?;
        Ok(data)
    }

    /// Full replacement of the editable fields.
    pub fn to_update(&self) -> Result<UpdatePatient> {
        let create = self.to_create()?;
        Ok(UpdatePatient {
            first_name: Some(create.first_name),
            last_name: Some(create.last_name),
            email: Some(create.email),
            phone_number: create.phone_number,
            address: create.address,
            date_of_birth: create.date_of_birth,
            gender: create.gender,
            blood_type: create.blood_type,
            emergency_contact: create.emergency_contact,
        })
    }
}

/// Form state for medical staff CRUD.
#[derive(Debug, Clone)]
pub struct StaffForm {
    pub id: Option<i64>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: Role,
    pub phone_number: String,
    pub specialization: String,
    pub department: String,
    pub license_number: String,
    pub is_open: bool,
    pub is_editing: bool,
}

impl Default for StaffForm {
    fn default() -> Self {
        Self {
            id: None,
            first_name: String::new(),
            last_name: String::new(),
            email: String::new(),
            role: Role::Doctor,
            phone_number: String::new(),
            specialization: String::new(),
            department: String::new(),
            license_number: String::new(),
            is_open: false,
            is_editing: false,
        }
    }
}

impl StaffForm {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn open_new() -> Self {
        Self {
            is_open: true,
            ..Default::default()
        }
    }

    pub fn edit(staff: &MedicalStaff) -> Self {
        Self {
            id: Some(staff.id),
            first_name: staff.first_name.clone(),
            last_name: staff.last_name.clone(),
            email: staff.email.clone(),
            role: staff.role,
            phone_number: staff.phone_number.clone().unwrap_or_default(),
            specialization: staff.specialization.clone().unwrap_or_default(),
            department: staff.department.clone().unwrap_or_default(),
            license_number: staff.license_number.clone().unwrap_or_default(),
            is_open: true,
            is_editing: true,
        }
    }

    pub fn to_create(&self) -> Result<CreateMedicalStaff> {
        if !self.role.is_staff() {
            return Err(AppError::validation("Staff role must be doctor, radiologist or admin"));
        }
        let email = required(&self.email, "Email")?;
        if !email.contains('@') {
            return Err(AppError::validation("A valid email is required"));
        }
        Ok(CreateMedicalStaff {
            first_name: required(&self.first_name, "First name")?,
            last_name: required(&self.last_name, "Last name")?,
            email,
            role: self.role,
            phone_number: optional(&self.phone_number),
            specialization: optional(&self.specialization),
            department: optional(&self.department),
            license_number: optional(&self.license_number),
        })
    }

    pub fn to_update(&self) -> Result<UpdateMedicalStaff> {
        let create = self.to_create()?;
        Ok(UpdateMedicalStaff {
            first_name: Some(create.first_name),
            last_name: Some(create.last_name),
            email: Some(create.email),
            role: Some(create.role),
            phone_number: create.phone_number,
            specialization: create.specialization,
            department: create.department,
            license_number: create.license_number,
        })
    }
}

/// Doctor's scan request dialog.
#[derive(Debug, Clone)]
pub struct ScanRequestForm {
    pub patient_id: Option<i64>,
    pub scan_type: String,
    pub body_part: String,
    pub reason: String,
    pub priority: Priority,
    pub is_open: bool,
}

/// Scan types offered in the request dialog.
pub const SCAN_TYPES: [&str; 5] = ["XRAY", "ULTRASOUND", "CT", "MRI", "PET"];

impl Default for ScanRequestForm {
    fn default() -> Self {
        Self {
            patient_id: None,
            scan_type: SCAN_TYPES[0].to_string(),
            body_part: String::new(),
            reason: String::new(),
            priority: Priority::Normal,
            is_open: false,
        }
    }
}

impl ScanRequestForm {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn for_patient(patient_id: Option<i64>) -> Self {
        Self {
            patient_id,
            is_open: true,
            ..Default::default()
        }
    }

    /// Build the request. A blank reason is rejected here, before any call.
    pub fn to_request(&self, doctor_id: Option<i64>) -> Result<CreateScanAppointment> {
        let patient_id = self
            .patient_id
            .ok_or_else(|| AppError::validation("Please select a patient"))?;
        let reason = self.reason.trim();
        if reason.is_empty() {
            return Err(AppError::validation("Please provide a reason for the scan"));
        }

        Ok(CreateScanAppointment {
            patient_id,
            doctor_id,
            scan_type: required(&self.scan_type, "Scan type")?,
            body_part: optional(&self.body_part),
            reason: reason.to_string(),
            priority: self.priority,
        })
    }
}

/// Radiologist accepts a request and picks a slot.
#[derive(Debug, Clone)]
pub struct ScheduleForm {
    pub appointment_id: Option<i64>,
    pub date: NaiveDate,
    pub time_input: String,
    pub notes: String,
    pub is_open: bool,
}

impl Default for ScheduleForm {
    fn default() -> Self {
        Self {
            appointment_id: None,
            date: Local::now().date_naive(),
            time_input: "09:00".to_string(),
            notes: String::new(),
            is_open: false,
        }
    }
}

impl ScheduleForm {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn open(appointment_id: i64) -> Self {
        Self {
            appointment_id: Some(appointment_id),
            is_open: true,
            ..Default::default()
        }
    }

    pub fn scheduled_at(&self) -> Result<NaiveDateTime> {
        let time = NaiveTime::parse_from_str(self.time_input.trim(), "%H:%M")
            .map_err(|_| AppError::validation("Invalid time (use HH:MM)"))?;
        Ok(self.date.and_time(time))
    }

    /// Schedule and assign to `radiologist_id` in one update.
    pub fn to_update(&self, radiologist_id: Option<i64>) -> Result<(i64, UpdateScanAppointment)> {
        let id = self
            .appointment_id
            .ok_or_else(|| AppError::validation("No appointment selected"))?;
        Ok((
            id,
            UpdateScanAppointment {
                status: Some(ScanStatus::Scheduled),
                radiologist_id,
                scheduled_at: Some(self.scheduled_at()?),
                notes: optional(&self.notes),
            },
        ))
    }
}

/// Visit record for the selected patient.
#[derive(Debug, Clone)]
pub struct RecordForm {
    pub patient_id: Option<i64>,
    pub visit_date: NaiveDate,
    pub chief_complaint: String,
    pub notes: String,
    pub treatment: String,
    pub is_open: bool,
}

impl Default for RecordForm {
    fn default() -> Self {
        Self {
            patient_id: None,
            visit_date: Local::now().date_naive(),
            chief_complaint: String::new(),
            notes: String::new(),
            treatment: String::new(),
            is_open: false,
        }
    }
}

impl RecordForm {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn for_patient(patient_id: i64) -> Self {
        Self {
            patient_id: Some(patient_id),
            is_open: true,
            ..Default::default()
        }
    }

    pub fn to_request(&self, doctor_id: Option<i64>) -> Result<CreateMedicalRecord> {
        let patient_id = self
            .patient_id
            .ok_or_else(|| AppError::validation("Please select a patient"))?;
        let chief_complaint = optional(&self.chief_complaint);
        let notes = optional(&self.notes);
        if chief_complaint.is_none() && notes.is_none() {
            return Err(AppError::validation("Enter a complaint or notes"));
        }
        Ok(CreateMedicalRecord {
            patient_id,
            doctor_id,
            visit_date: Some(self.visit_date),
            chief_complaint,
            notes,
            treatment: optional(&self.treatment),
        })
    }
}

#[derive(Debug, Default, Clone)]
pub struct DiagnosisForm {
    pub patient_id: Option<i64>,
    pub medical_record_id: Option<i64>,
    pub code: String,
    pub description: String,
    pub severity: Option<String>,
    pub is_open: bool,
}

pub const SEVERITIES: [&str; 4] = ["MILD", "MODERATE", "SEVERE", "CRITICAL"];

impl DiagnosisForm {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn for_patient(patient_id: i64) -> Self {
        Self {
            patient_id: Some(patient_id),
            is_open: true,
            ..Default::default()
        }
    }

    pub fn to_request(&self, doctor_id: Option<i64>) -> Result<CreateDiagnosis> {
        let patient_id = self
            .patient_id
            .ok_or_else(|| AppError::validation("Please select a patient"))?;
        let data = CreateDiagnosis {
            patient_id,
            medical_record_id: self.medical_record_id,
            doctor_id,
            code: optional(&self.code),
            description: self.description.trim().to_string(),
            severity: self.severity.clone(),
        };
        data.validate()?;
        Ok(data)
    }
}

/// Radiologist's report editor.
#[derive(Debug, Clone)]
pub struct ReportForm {
    pub id: Option<i64>,
    pub patient_id_input: String,
    pub image_id: Option<i64>,
    pub title: String,
    pub content: String,
    pub status: String,
    pub is_open: bool,
}

pub const REPORT_STATUSES: [&str; 3] = ["DRAFT", "PRELIMINARY", "FINAL"];

impl Default for ReportForm {
    fn default() -> Self {
        Self {
            id: None,
            patient_id_input: String::new(),
            image_id: None,
            title: String::new(),
            content: String::new(),
            status: REPORT_STATUSES[0].to_string(),
            is_open: false,
        }
    }
}

impl ReportForm {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn for_image(patient_id: i64, image_id: Option<i64>) -> Self {
        Self {
            patient_id_input: patient_id.to_string(),
            image_id,
            is_open: true,
            ..Default::default()
        }
    }

    pub fn edit(report: &crate::models::Report) -> Self {
        Self {
            id: Some(report.id),
            patient_id_input: report.patient_id.to_string(),
            image_id: report.image_id,
            title: report.title.clone().unwrap_or_default(),
            content: report.report_content.clone(),
            status: report.status.clone().unwrap_or_else(|| REPORT_STATUSES[0].to_string()),
            is_open: true,
        }
    }

    pub fn to_request(&self, radiologist_id: Option<i64>) -> Result<CreateReport> {
        let patient_id = self
            .patient_id_input
            .trim()
            .parse::<i64>()
            .map_err(|_| AppError::validation("Patient ID must be a number"))?;
        let data = CreateReport {
            patient_id,
            image_id: self.image_id,
            radiologist_id,
            title: optional(&self.title),
            report_content: self.content.trim().to_string(),
            status: optional(&self.status),
        };
        data.validate()?;
        Ok(data)
    }
}

/// Admin adds a manual charge to the open statement.
#[derive(Debug, Default, Clone)]
pub struct ChargeForm {
    pub account_id: Option<i64>,
    pub description: String,
    pub amount_input: String,
    pub service_type: String,
    pub is_open: bool,
}

impl ChargeForm {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn for_account(account_id: i64) -> Self {
        Self {
            account_id: Some(account_id),
            is_open: true,
            ..Default::default()
        }
    }

    pub fn to_request(&self) -> Result<CreateCharge> {
        let account_id = self
            .account_id
            .ok_or_else(|| AppError::validation("No billing account selected"))?;
        let amount = self
            .amount_input
            .trim()
            .parse::<f64>()
            .map_err(|_| AppError::validation("Amount must be a number"))?;
        let data = CreateCharge {
            account_id,
            description: required(&self.description, "Description")?,
            amount,
            service_type: optional(&self.service_type),
        };
        data.validate()?;
        Ok(data)
    }
}

#[derive(Debug, Default, Clone)]
pub struct UploadForm {
    pub path: Option<PathBuf>,
    pub patient_id_input: String,
    pub image_type: String,
    pub body_part: String,
    pub tag: String,
    pub description: String,
    pub is_open: bool,
}

pub const IMAGE_TYPES: [&str; 5] = ["XRAY", "CT", "MRI", "ULTRASOUND", "PET"];

impl UploadForm {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn open_new() -> Self {
        Self {
            image_type: IMAGE_TYPES[0].to_string(),
            is_open: true,
            ..Default::default()
        }
    }

    pub fn to_upload(&self) -> Result<ImageUpload> {
        let path = self
            .path
            .clone()
            .ok_or_else(|| AppError::validation("Choose a file to upload"))?;
        let patient_id = self
            .patient_id_input
            .trim()
            .parse::<i64>()
            .map_err(|_| AppError::validation("Patient ID must be a number"))?;
        let upload = ImageUpload {
            path,
            patient_id,
            image_type: self.image_type.trim().to_string(),
            body_part: optional(&self.body_part),
            tag: optional(&self.tag),
            description: optional(&self.description),
        };
        upload.validate()?;
        Ok(upload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flexible_date() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 9);
        assert_eq!(parse_flexible_date("2024-03-09"), expected);
        assert_eq!(parse_flexible_date(" 2024/03/09 "), expected);
        assert_eq!(parse_flexible_date("09/03/2024"), expected);
        assert_eq!(parse_flexible_date("tomorrow"), None);
        assert_eq!(parse_flexible_date(""), None);
    }

    #[test]
    fn test_scan_request_requires_reason() {
        let form = ScanRequestForm {
            patient_id: Some(3),
            reason: "   ".to_string(),
            ..Default::default()
        };
        assert!(matches!(form.to_request(Some(1)), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_scan_request_requires_patient() {
        let form = ScanRequestForm {
            reason: "Persistent headache".to_string(),
            ..Default::default()
        };
        assert!(form.to_request(Some(1)).is_err());
    }

    #[test]
    fn test_scan_request_trims_fields() {
        let form = ScanRequestForm {
            patient_id: Some(3),
            scan_type: "MRI".to_string(),
            body_part: "  ".to_string(),
            reason: "  Persistent headache ".to_string(),
            priority: Priority::High,
            is_open: true,
        };
        let request = form.to_request(Some(8)).unwrap();
        assert_eq!(request.reason, "Persistent headache");
        assert_eq!(request.body_part, None);
        assert_eq!(request.doctor_id, Some(8));
        assert_eq!(request.priority, Priority::High);
    }

    #[test]
    fn test_schedule_form() {
        let mut form = ScheduleForm::open(12);
        form.date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        form.time_input = "14:30".to_string();

        let (id, update) = form.to_update(Some(4)).unwrap();
        assert_eq!(id, 12);
        assert_eq!(update.status, Some(ScanStatus::Scheduled));
        assert_eq!(update.radiologist_id, Some(4));
        assert_eq!(update.scheduled_at.unwrap().to_string(), "2024-05-01 14:30:00");

        form.time_input = "2pm".to_string();
        assert!(form.to_update(Some(4)).is_err());
    }

    #[test]
    fn test_patient_form_rejects_bad_date() {
        let form = PatientForm {
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email: "ada@example.org".to_string(),
            date_of_birth_input: "someday".to_string(),
            ..Default::default()
        };
        assert!(form.to_create().is_err());
    }

    #[test]
    fn test_patient_form_edit_roundtrip() {
        let patient: Patient = serde_json::from_str(
            r#"{"id":1,"firstName":"Ada","lastName":"Lovelace","email":"ada@example.org","dateOfBirth":"1815-12-10"}"#,
        )
        .unwrap();
        let form = PatientForm::edit(&patient);
        assert!(form.is_editing);

        let update = form.to_update().unwrap();
        assert_eq!(update.first_name.as_deref(), Some("Ada"));
        assert_eq!(update.date_of_birth, NaiveDate::from_ymd_opt(1815, 12, 10));
        assert_eq!(update.phone_number, None);
    }

    #[test]
    fn test_staff_form_rejects_patient_role() {
        let form = StaffForm {
            first_name: "A".to_string(),
            last_name: "B".to_string(),
            email: "a@b.org".to_string(),
            role: Role::Patient,
            ..Default::default()
        };
        assert!(form.to_create().is_err());
    }

    #[test]
    fn test_charge_form_amount() {
        let mut form = ChargeForm::for_account(2);
        form.description = "Consultation".to_string();
        form.amount_input = "abc".to_string();
        assert!(form.to_request().is_err());

        form.amount_input = "75.50".to_string();
        let charge = form.to_request().unwrap();
        assert_eq!(charge.amount, 75.5);
        assert_eq!(charge.account_id, 2);
    }

    #[test]
    fn test_record_form_needs_content() {
        let mut form = RecordForm::for_patient(5);
        assert!(form.to_request(Some(1)).is_err());

        form.notes = "Follow-up in two weeks".to_string();
        let record = form.to_request(Some(1)).unwrap();
        assert_eq!(record.patient_id, 5);
        assert!(record.visit_date.is_some());
    }

    #[test]
    fn test_report_form_patient_id() {
        let mut form = ReportForm::for_image(7, Some(3));
        form.content = r#"{"findings":"Clear"}"#.to_string();
        let report = form.to_request(Some(2)).unwrap();
        assert_eq!(report.patient_id, 7);
        assert_eq!(report.image_id, Some(3));

        form.patient_id_input = "seven".to_string();
        assert!(form.to_request(Some(2)).is_err());
    }

    #[test]
    fn test_upload_form_requires_file() {
        let mut form = UploadForm::open_new();
        form.patient_id_input = "1".to_string();
        assert!(form.to_upload().is_err());
    }
}
