//! Medical records, diagnoses and reports under `/analytics`.

use super::{ApiClient, billing};
use crate::error::Result;
use crate::models::{CreateDiagnosis, CreateMedicalRecord, CreateReport, Diagnosis, MedicalRecord, Report};

const RECORDS: &str = "/analytics/medical-records";
const DIAGNOSES: &str = "/analytics/diagnoses";
const REPORTS: &str = "/analytics/reports";

/// Flat fee billed when a radiologist files a new report.
pub const REPORT_FEE: f64 = 150.0;

// Medical records

pub async fn list_records(api: &ApiClient) -> Result<Vec<MedicalRecord>> {
    api.get(RECORDS).await
}

pub async fn list_records_by_patient(api: &ApiClient, patient_id: i64) -> Result<Vec<MedicalRecord>> {
    api.get(&format!("{RECORDS}/patient/{patient_id}")).await
}

pub async fn create_record(api: &ApiClient, data: &CreateMedicalRecord) -> Result<MedicalRecord> {
    api.post(RECORDS, data).await
}

pub async fn update_record(api: &ApiClient, id: i64, data: &CreateMedicalRecord) -> Result<MedicalRecord> {
    api.put(&format!("{RECORDS}/{id}"), data).await
}

pub async fn delete_record(api: &ApiClient, id: i64) -> Result<()> {
    api.delete(&format!("{RECORDS}/{id}")).await
}

// Diagnoses

pub async fn list_diagnoses_by_patient(api: &ApiClient, patient_id: i64) -> Result<Vec<Diagnosis>> {
    api.get(&format!("{DIAGNOSES}/patient/{patient_id}")).await
}

pub async fn create_diagnosis(api: &ApiClient, data: &CreateDiagnosis) -> Result<Diagnosis> {
    data.validate()?;
    api.post(DIAGNOSES, data).await
}

pub async fn update_diagnosis(api: &ApiClient, id: i64, data: &CreateDiagnosis) -> Result<Diagnosis> {
    data.validate()?;
    api.put(&format!("{DIAGNOSES}/{id}"), data).await
}

pub async fn delete_diagnosis(api: &ApiClient, id: i64) -> Result<()> {
    api.delete(&format!("{DIAGNOSES}/{id}")).await
}

// Reports

pub async fn list_reports(api: &ApiClient) -> Result<Vec<Report>> {
    api.get(REPORTS).await
}

pub async fn list_reports_by_patient(api: &ApiClient, patient_id: i64) -> Result<Vec<Report>> {
    api.get(&format!("{REPORTS}/patient/{patient_id}")).await
}

/// Create a report, then bill the interpretation fee on a best-effort basis.
pub async fn create_report(api: &ApiClient, data: &CreateReport) -> Result<Report> {
    data.validate()?;
    let report: Report = api.post(REPORTS, data).await?;
    billing::charge_best_effort(api, report.patient_id, "Radiology report", REPORT_FEE, "REPORT").await;
    Ok(report)
}

pub async fn update_report(api: &ApiClient, id: i64, data: &CreateReport) -> Result<Report> {
    data.validate()?;
    api.put(&format!("{REPORTS}/{id}"), data).await
}

pub async fn delete_report(api: &ApiClient, id: i64) -> Result<()> {
    api.delete(&format!("{REPORTS}/{id}")).await
}

/// Records, diagnoses and reports of one patient, fetched side by side.
///
/// Each list succeeds or fails on its own.
#[derive(Debug)]
pub struct PatientHistory {
    pub records: Result<Vec<MedicalRecord>>,
    pub diagnoses: Result<Vec<Diagnosis>>,
    pub reports: Result<Vec<Report>>,
}

pub async fn load_patient_history(api: &ApiClient, patient_id: i64) -> PatientHistory {
    let (records, diagnoses, reports) = tokio::join!(
        list_records_by_patient(api, patient_id),
        list_diagnoses_by_patient(api, patient_id),
        list_reports_by_patient(api, patient_id),
    );
    PatientHistory {
        records,
        diagnoses,
        reports,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::tests::{client_for, serve_once, signed_in};
    use crate::error::AppError;

    #[tokio::test]
    async fn test_reports_by_patient_path() {
        let body = r#"[{"id":1,"patientId":3,"reportContent":"{\"impression\":\"Normal\"}"}]"#;
        let (base, server) = serve_once("200 OK", body).await;
        let api = client_for(&base, signed_in("PATIENT"));

        let reports = list_reports_by_patient(&api, 3).await.unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].report_content, "{\"impression\":\"Normal\"}");
        assert!(server.await.unwrap().starts_with("GET /api/analytics/reports/patient/3 "));
    }

    #[tokio::test]
    async fn test_empty_report_is_not_sent() {
        let api = client_for("http://127.0.0.1:9", signed_in("RADIOLOGIST"));
        let data = CreateReport {
            patient_id: 1,
            ..Default::default()
        };
        assert!(matches!(create_report(&api, &data).await, Err(AppError::Validation(_))));
    }
}
