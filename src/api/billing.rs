//! Billing account and charge endpoints.

use super::ApiClient;
use crate::error::Result;
use crate::models::{BillingAccount, Charge, CreateBillingAccount, CreateCharge};

pub async fn get_account_by_patient(api: &ApiClient, patient_id: i64) -> Result<BillingAccount> {
    api.get(&format!("/billing/accounts/patient/{patient_id}")).await
}

pub async fn create_account(api: &ApiClient, data: &CreateBillingAccount) -> Result<BillingAccount> {
    api.post("/billing/accounts", data).await
}

pub async fn list_charges(api: &ApiClient, account_id: i64) -> Result<Vec<Charge>> {
    api.get(&format!("/billing/accounts/{account_id}/charges")).await
}

pub async fn create_charge(api: &ApiClient, data: &CreateCharge) -> Result<Charge> {
    data.validate()?;
    api.post("/billing/charges", data).await
}

pub async fn pay_charge(api: &ApiClient, charge_id: i64) -> Result<Charge> {
    api.patch(&format!("/billing/charges/{charge_id}/pay")).await
}

/// Account plus its charges.
pub async fn load_statement(api: &ApiClient, patient_id: i64) -> Result<(BillingAccount, Vec<Charge>)> {
    let account = get_account_by_patient(api, patient_id).await?;
    let charges = list_charges(api, account.id).await?;
    Ok((account, charges))
}

/// Bill a patient for a service after the medical action already succeeded.
///
/// Never fails: a billing problem must not undo or block the primary action.
pub async fn charge_best_effort(api: &ApiClient, patient_id: i64, description: &str, amount: f64, service_type: &str) {
    let result = async {
        let account = get_account_by_patient(api, patient_id).await?;
        create_charge(
            api,
            &CreateCharge {
                account_id: account.id,
                description: description.to_string(),
                amount,
                service_type: Some(service_type.to_string()),
            },
        )
        .await
    }
    .await;

    match result {
        Ok(charge) => tracing::info!("Billed patient {} charge #{} ({:.2})", patient_id, charge.id, amount),
        Err(e) => tracing::warn!("Billing for patient {} skipped: {}", patient_id, e),
    }
}

/// Standard fee for a completed scan of the given type.
pub fn scan_fee(scan_type: &str) -> f64 {
    match scan_type.trim().to_ascii_uppercase().as_str() {
        "XRAY" | "X-RAY" => 120.0,
        "ULTRASOUND" => 180.0,
        "CT" => 450.0,
        "MRI" => 800.0,
        "PET" => 1200.0,
        _ => 250.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::tests::{client_for, serve_once, signed_in};

    #[test]
    fn test_scan_fee() {
        assert_eq!(scan_fee("mri"), 800.0);
        assert_eq!(scan_fee(" X-Ray "), 120.0);
        assert_eq!(scan_fee("something else"), 250.0);
    }

    #[tokio::test]
    async fn test_pay_charge_uses_patch() {
        let body = r#"{"id":5,"accountId":1,"description":"MRI","amount":800.0,"status":"PAID"}"#;
        let (base, server) = serve_once("200 OK", body).await;
        let api = client_for(&base, signed_in("PATIENT"));

        let charge = pay_charge(&api, 5).await.unwrap();
        assert_eq!(charge.status, crate::models::ChargeStatus::Paid);
        assert!(server.await.unwrap().starts_with("PATCH /api/billing/charges/5/pay "));
    }

    #[tokio::test]
    async fn test_charge_best_effort_swallows_failure() {
        let (base, server) = serve_once("404 Not Found", r#"{"message":"No account"}"#).await;
        let api = client_for(&base, signed_in("RADIOLOGIST"));

        // Must return normally even though the account lookup fails
        charge_best_effort(&api, 1, "MRI scan", 800.0, "SCAN").await;
        server.await.unwrap();
    }
}
