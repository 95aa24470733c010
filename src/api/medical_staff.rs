//! Medical staff endpoints.

use super::ApiClient;
use crate::error::Result;
use crate::models::{CreateMedicalStaff, MedicalStaff, UpdateMedicalStaff};
use crate::routing::Role;

pub async fn list_all(api: &ApiClient) -> Result<Vec<MedicalStaff>> {
    api.get("/medical-staff").await
}

pub async fn list_by_role(api: &ApiClient, role: Role) -> Result<Vec<MedicalStaff>> {
    api.get(&format!("/medical-staff/role/{role}")).await
}

pub async fn get_by_id(api: &ApiClient, id: i64) -> Result<MedicalStaff> {
    api.get(&format!("/medical-staff/{id}")).await
}

pub async fn get_by_user(api: &ApiClient, user_id: i64) -> Result<MedicalStaff> {
    api.get(&format!("/medical-staff/user/{user_id}")).await
}

pub async fn create(api: &ApiClient, data: &CreateMedicalStaff) -> Result<MedicalStaff> {
    if data.first_name.trim().is_empty() || data.last_name.trim().is_empty() {
        return Err(crate::AppError::validation("First and last name are required"));
    }
    api.post("/medical-staff", data).await
}

pub async fn update(api: &ApiClient, id: i64, data: &UpdateMedicalStaff) -> Result<MedicalStaff> {
    api.put(&format!("/medical-staff/{id}"), data).await
}

pub async fn delete(api: &ApiClient, id: i64) -> Result<()> {
    api.delete(&format!("/medical-staff/{id}")).await
}

/// Staff list used only to label rows with names.
///
/// Failures are logged and yield an empty list so the main data still renders.
pub async fn lookup_names(api: &ApiClient) -> Vec<MedicalStaff> {
    match list_all(api).await {
        Ok(staff) => staff,
        Err(e) => {
            tracing::warn!("Staff name lookup failed: {}", e);
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::tests::{client_for, serve_once, signed_in};

    #[tokio::test]
    async fn test_list_by_role_path() {
        let (base, server) = serve_once("200 OK", "[]").await;
        let api = client_for(&base, signed_in("ADMIN"));

        let staff = list_by_role(&api, Role::Radiologist).await.unwrap();
        assert!(staff.is_empty());
        assert!(server.await.unwrap().starts_with("GET /api/medical-staff/role/RADIOLOGIST "));
    }

    #[tokio::test]
    async fn test_lookup_names_swallows_failure() {
        let (base, server) = serve_once("500 Internal Server Error", "").await;
        let api = client_for(&base, signed_in("DOCTOR"));

        assert!(lookup_names(&api).await.is_empty());
        server.await.unwrap();
    }
}
