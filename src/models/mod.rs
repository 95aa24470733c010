//! Data models mirrored from the backend REST API.

pub mod analytics;
pub mod auth;
pub mod billing;
pub mod image;
pub mod patient;
pub mod scan;
pub mod staff;

pub use analytics::{CreateDiagnosis, CreateMedicalRecord, CreateReport, Diagnosis, MedicalRecord, Report};
pub use auth::{LoginRequest, LoginResponse};
pub use billing::{BillingAccount, Charge, ChargeStatus, CreateBillingAccount, CreateCharge};
pub use image::{ImageUpload, MedicalImage};
pub use patient::{CreatePatient, Patient, UpdatePatient};
pub use scan::{CreateScanAppointment, Priority, ScanAppointment, ScanStatus, UpdateScanAppointment};
pub use staff::{CreateMedicalStaff, MedicalStaff, UpdateMedicalStaff};
