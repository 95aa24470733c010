//! Patient endpoints.

use super::ApiClient;
use crate::error::Result;
use crate::models::{CreatePatient, Patient, UpdatePatient};

/// List all patients.
pub async fn list_all(api: &ApiClient) -> Result<Vec<Patient>> {
    api.get("/patients").await
}

/// Get patient by ID.
pub async fn get_by_id(api: &ApiClient, id: i64) -> Result<Patient> {
    api.get(&format!("/patients/{id}")).await
}

/// Get the patient linked to a login account.
pub async fn get_by_user(api: &ApiClient, user_id: i64) -> Result<Patient> {
    api.get(&format!("/patients/user/{user_id}")).await
}

/// Create a new patient.
pub async fn create(api: &ApiClient, data: &CreatePatient) -> Result<Patient> {
    data.validate()?;
    api.post("/patients", data).await
}

/// Update an existing patient.
pub async fn update(api: &ApiClient, id: i64, data: &UpdatePatient) -> Result<Patient> {
    api.put(&format!("/patients/{id}"), data).await
}

/// Delete a patient by ID.
pub async fn delete(api: &ApiClient, id: i64) -> Result<()> {
    api.delete(&format!("/patients/{id}")).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::tests::{client_for, serve_once, signed_in};
    use crate::error::AppError;

    #[tokio::test]
    async fn test_get_by_id() {
        let body = r#"{"id":9,"firstName":"Ada","lastName":"Lovelace","email":"ada@example.org"}"#;
        let (base, server) = serve_once("200 OK", body).await;
        let api = client_for(&base, signed_in("DOCTOR"));

        let patient = get_by_id(&api, 9).await.unwrap();
        assert_eq!(patient.full_name(), "Ada Lovelace");
        assert!(server.await.unwrap().starts_with("GET /api/patients/9 "));
    }

    #[tokio::test]
    async fn test_create_validates_before_sending() {
        // Nothing listens here; validation must fail first.
        let api = client_for("http://127.0.0.1:9", signed_in("ADMIN"));
        let result = create(&api, &CreatePatient::default()).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}
