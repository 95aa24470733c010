//! GUI panels and application state.

pub mod app;
pub mod billing_panel;
pub mod components;
pub mod dashboard;
pub mod forms;
pub mod image_review_panel;
pub mod login;
pub mod patient_records_panel;
pub mod profile_panel;
pub mod reports_panel;
pub mod scan_panel;
pub mod settings_panel;
pub mod setup_wizard;
pub mod staff_panel;
pub mod toast;

pub use app::App;
pub use setup_wizard::{SetupApp, SetupWizard};
