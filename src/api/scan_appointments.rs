//! Scan appointment endpoints.
//!
//! Status changes all go through [`update`]; the backend decides whether a
//! transition is allowed.

use super::ApiClient;
use super::billing;
use crate::error::Result;
use crate::models::{CreateScanAppointment, ScanAppointment, ScanStatus, UpdateScanAppointment};

const BASE: &str = "/scan-appointments";

/// Request a new scan.
pub async fn create(api: &ApiClient, data: &CreateScanAppointment) -> Result<ScanAppointment> {
    if data.reason.trim().is_empty() {
        return Err(crate::AppError::validation("Please provide a reason for the scan"));
    }
    api.post(BASE, data).await
}

pub async fn list_all(api: &ApiClient) -> Result<Vec<ScanAppointment>> {
    api.get(BASE).await
}

pub async fn get_by_id(api: &ApiClient, id: i64) -> Result<ScanAppointment> {
    api.get(&format!("{BASE}/{id}")).await
}

pub async fn list_by_patient(api: &ApiClient, patient_id: i64) -> Result<Vec<ScanAppointment>> {
    api.get(&format!("{BASE}/patient/{patient_id}")).await
}

pub async fn list_by_doctor(api: &ApiClient, doctor_id: i64) -> Result<Vec<ScanAppointment>> {
    api.get(&format!("{BASE}/doctor/{doctor_id}")).await
}

pub async fn list_by_radiologist(api: &ApiClient, radiologist_id: i64) -> Result<Vec<ScanAppointment>> {
    api.get(&format!("{BASE}/radiologist/{radiologist_id}")).await
}

/// Requests nobody has picked up yet.
pub async fn list_unassigned(api: &ApiClient) -> Result<Vec<ScanAppointment>> {
    api.get(&format!("{BASE}/unassigned")).await
}

pub async fn list_upcoming(api: &ApiClient, radiologist_id: i64) -> Result<Vec<ScanAppointment>> {
    api.get(&format!("{BASE}/radiologist/{radiologist_id}/upcoming")).await
}

/// Generic update: status, assignment, schedule or notes.
pub async fn update(api: &ApiClient, id: i64, data: &UpdateScanAppointment) -> Result<ScanAppointment> {
    api.put(&format!("{BASE}/{id}"), data).await
}

pub async fn delete(api: &ApiClient, id: i64) -> Result<()> {
    api.delete(&format!("{BASE}/{id}")).await
}

/// Apply a status change and bill the patient when the scan completes.
pub async fn change_status(api: &ApiClient, appointment: &ScanAppointment, status: ScanStatus) -> Result<ScanAppointment> {
    let updated = update(api, appointment.id, &UpdateScanAppointment::status(status)).await?;

    if updated.status == ScanStatus::Completed && appointment.status != ScanStatus::Completed {
        billing::charge_best_effort(
            api,
            updated.patient_id,
            &format!("{} scan", updated.scan_type),
            billing::scan_fee(&updated.scan_type),
            "SCAN",
        )
        .await;
    }

    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::tests::{client_for, serve_once, signed_in};
    use crate::error::AppError;
    use crate::models::Priority;

    #[tokio::test]
    async fn test_empty_reason_never_calls_api() {
        // Unroutable target: any request would fail with a network error instead.
        let api = client_for("http://127.0.0.1:9", signed_in("DOCTOR"));
        let data = CreateScanAppointment {
            patient_id: 1,
            doctor_id: Some(2),
            scan_type: "MRI".to_string(),
            body_part: None,
            reason: "   ".to_string(),
            priority: Priority::Normal,
        };
        assert!(matches!(create(&api, &data).await, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_unassigned_path() {
        let (base, server) = serve_once("200 OK", r#"[{"id":1,"patientId":2,"scanType":"CT"}]"#).await;
        let api = client_for(&base, signed_in("RADIOLOGIST"));

        let list = list_unassigned(&api).await.unwrap();
        assert_eq!(list.len(), 1);
        assert!(server.await.unwrap().starts_with("GET /api/scan-appointments/unassigned "));
    }

    #[tokio::test]
    async fn test_change_status_sends_generic_update() {
        let body = r#"{"id":7,"patientId":2,"scanType":"CT","status":"SCHEDULED"}"#;
        let (base, server) = serve_once("200 OK", body).await;
        let api = client_for(&base, signed_in("RADIOLOGIST"));
        let appointment: ScanAppointment =
            serde_json::from_str(r#"{"id":7,"patientId":2,"scanType":"CT","status":"REQUESTED"}"#).unwrap();

        let updated = change_status(&api, &appointment, ScanStatus::Scheduled).await.unwrap();
        assert_eq!(updated.status, ScanStatus::Scheduled);
        assert!(server.await.unwrap().starts_with("PUT /api/scan-appointments/7 "));
    }
}
