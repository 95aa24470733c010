//! Billing account and charge DTOs.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A patient's billing account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillingAccount {
    pub id: i64,
    pub patient_id: i64,
    #[serde(default)]
    pub balance: f64,
    #[serde(default)]
    pub insurance_provider: Option<String>,
    #[serde(default)]
    pub policy_number: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBillingAccount {
    pub patient_id: i64,
    pub insurance_provider: Option<String>,
    pub policy_number: Option<String>,
}

/// Charge payment status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChargeStatus {
    #[default]
    Pending,
    Paid,
    Cancelled,
}

impl ChargeStatus {
    pub fn label(&self) -> &'static str {
        match self {
            ChargeStatus::Pending => "Pending",
            ChargeStatus::Paid => "Paid",
            ChargeStatus::Cancelled => "Cancelled",
        }
    }
}

/// A single line item on an account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Charge {
    pub id: i64,
    pub account_id: i64,
    pub description: String,
    pub amount: f64,
    #[serde(default)]
    pub status: ChargeStatus,
    #[serde(default)]
    pub service_type: Option<String>,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCharge {
    pub account_id: i64,
    pub description: String,
    pub amount: f64,
    pub service_type: Option<String>,
}

impl CreateCharge {
    pub fn validate(&self) -> crate::Result<()> {
        if self.description.trim().is_empty() {
            return Err(crate::AppError::validation("Charge description is required"));
        }
        if !self.amount.is_finite() || self.amount <= 0.0 {
            return Err(crate::AppError::validation("Charge amount must be positive"));
        }
        Ok(())
    }
}

/// Sum of charges still awaiting payment.
pub fn outstanding_total(charges: &[Charge]) -> f64 {
    charges
        .iter()
        .filter(|c| c.status == ChargeStatus::Pending)
        .map(|c| c.amount)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn charge(id: i64, amount: f64, status: ChargeStatus) -> Charge {
        Charge {
            id,
            account_id: 1,
            description: format!("Item {id}"),
            amount,
            status,
            service_type: None,
            created_at: None,
        }
    }

    #[test]
    fn test_outstanding_total() {
        let charges = vec![
            charge(1, 100.0, ChargeStatus::Pending),
            charge(2, 50.0, ChargeStatus::Paid),
            charge(3, 25.5, ChargeStatus::Pending),
            charge(4, 10.0, ChargeStatus::Cancelled),
        ];
        assert!((outstanding_total(&charges) - 125.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_charge_status_wire_format() {
        let c: Charge =
            serde_json::from_str(r#"{"id":1,"accountId":2,"description":"CT","amount":300.0,"status":"PAID"}"#)
                .unwrap();
        assert_eq!(c.status, ChargeStatus::Paid);
    }

    #[test]
    fn test_create_charge_validation() {
        let mut data = CreateCharge {
            account_id: 1,
            description: "Consultation".to_string(),
            amount: 80.0,
            service_type: None,
        };
        assert!(data.validate().is_ok());

        data.amount = 0.0;
        assert!(data.validate().is_err());

        data.amount = f64::NAN;
        assert!(data.validate().is_err());
    }
}
