//! Roles and role-based navigation.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Portal user role as issued by the backend.
///
/// Serialized as `DOCTOR` etc.; deserialized leniently through [`FromStr`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", try_from = "String")]
pub enum Role {
    Patient,
    Doctor,
    Radiologist,
    Admin,
}

impl Role {
    /// Wire representation of the role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Patient => "PATIENT",
            Role::Doctor => "DOCTOR",
            Role::Radiologist => "RADIOLOGIST",
            Role::Admin => "ADMIN",
        }
    }

    /// Display name for headers and menus.
    pub fn label(&self) -> &'static str {
        match self {
            Role::Patient => "Patient",
            Role::Doctor => "Doctor",
            Role::Radiologist => "Radiologist",
            Role::Admin => "Administrator",
        }
    }

    /// Whether the role belongs to medical staff rather than a patient.
    pub fn is_staff(&self) -> bool {
        !matches!(self, Role::Patient)
    }

    /// Panels reachable from this role's dashboard, in display order.
    pub fn panels(&self) -> &'static [Panel] {
        match self {
            Role::Patient => &[
                Panel::Profile,
                Panel::ScanAppointments,
                Panel::Reports,
                Panel::Billing,
            ],
            Role::Doctor => &[
                Panel::PatientRecords,
                Panel::ScanAppointments,
                Panel::ImageReview,
                Panel::Reports,
                Panel::Billing,
                Panel::Profile,
            ],
            Role::Radiologist => &[
                Panel::ScanAppointments,
                Panel::ImageReview,
                Panel::Reports,
                Panel::Profile,
            ],
            Role::Admin => &[
                Panel::PatientRecords,
                Panel::Staff,
                Panel::ScanAppointments,
                Panel::ImageReview,
                Panel::Billing,
            ],
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    /// Accepts `doctor`, `DOCTOR` and `ROLE_DOCTOR`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        let name = upper.strip_prefix("ROLE_").unwrap_or(&upper);
        match name {
            "PATIENT" => Ok(Role::Patient),
            "DOCTOR" => Ok(Role::Doctor),
            "RADIOLOGIST" => Ok(Role::Radiologist),
            "ADMIN" => Ok(Role::Admin),
            _ => Err(format!("Unknown role: {s}")),
        }
    }
}

impl TryFrom<String> for Role {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Panels inside the signed-in area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Panel {
    #[default]
    Dashboard,
    Profile,
    PatientRecords,
    ImageReview,
    Reports,
    Billing,
    ScanAppointments,
    Staff,
    Settings,
}

impl Panel {
    /// Get the display name for the panel.
    pub fn name(&self) -> &'static str {
        match self {
            Panel::Dashboard => "Dashboard",
            Panel::Profile => "My Profile",
            Panel::PatientRecords => "Patient Records",
            Panel::ImageReview => "Image Review",
            Panel::Reports => "Reports",
            Panel::Billing => "Billing",
            Panel::ScanAppointments => "Scan Appointments",
            Panel::Staff => "Medical Staff",
            Panel::Settings => "Settings",
        }
    }

    /// Short description shown on dashboard cards.
    pub fn description(&self) -> &'static str {
        match self {
            Panel::Dashboard => "Overview",
            Panel::Profile => "Personal details",
            Panel::PatientRecords => "Search and manage patients",
            Panel::ImageReview => "Medical images",
            Panel::Reports => "Radiology reports",
            Panel::Billing => "Accounts and charges",
            Panel::ScanAppointments => "Radiology workflow",
            Panel::Staff => "Doctors and radiologists",
            Panel::Settings => "Connection and display",
        }
    }
}

/// Top-level destination after reading the stored role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Login,
    Dashboard(Role),
}

/// Resolve where a user lands: their role's dashboard, or login without a role.
pub fn resolve_home(role: Option<Role>) -> Route {
    match role {
        Some(Role::Patient) => Route::Dashboard(Role::Patient),
        Some(Role::Doctor) => Route::Dashboard(Role::Doctor),
        Some(Role::Radiologist) => Route::Dashboard(Role::Radiologist),
        Some(Role::Admin) => Route::Dashboard(Role::Admin),
        None => Route::Login,
    }
}

/// Whether `role` may open `panel`.
pub fn can_open(role: Role, panel: Panel) -> bool {
    matches!(panel, Panel::Dashboard | Panel::Settings) || role.panels().contains(&panel)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_each_role_routes_to_its_dashboard() {
        for role in [Role::Patient, Role::Doctor, Role::Radiologist, Role::Admin] {
            assert_eq!(resolve_home(Some(role)), Route::Dashboard(role));
        }
    }

    #[test]
    fn test_absent_role_routes_to_login() {
        assert_eq!(resolve_home(None), Route::Login);
    }

    #[test]
    fn test_parse_role_variants() {
        assert_eq!("PATIENT".parse::<Role>().unwrap(), Role::Patient);
        assert_eq!("doctor".parse::<Role>().unwrap(), Role::Doctor);
        assert_eq!("ROLE_RADIOLOGIST".parse::<Role>().unwrap(), Role::Radiologist);
        assert_eq!(" Admin ".parse::<Role>().unwrap(), Role::Admin);
        assert!("nurse".parse::<Role>().is_err());
        assert!("".parse::<Role>().is_err());
    }

    #[test]
    fn test_role_serde_uses_uppercase() {
        let json = serde_json::to_string(&Role::Radiologist).unwrap();
        assert_eq!(json, "\"RADIOLOGIST\"");
        let role: Role = serde_json::from_str("\"ADMIN\"").unwrap();
        assert_eq!(role, Role::Admin);
    }

    #[test]
    fn test_role_deserialize_is_lenient() {
        let role: Role = serde_json::from_str("\"ROLE_DOCTOR\"").unwrap();
        assert_eq!(role, Role::Doctor);
        let role: Role = serde_json::from_str("\"radiologist\"").unwrap();
        assert_eq!(role, Role::Radiologist);
        assert!(serde_json::from_str::<Role>("\"NURSE\"").is_err());
    }

    #[test]
    fn test_panel_access() {
        assert!(can_open(Role::Patient, Panel::Billing));
        assert!(!can_open(Role::Patient, Panel::PatientRecords));
        assert!(!can_open(Role::Radiologist, Panel::Staff));
        assert!(can_open(Role::Admin, Panel::Staff));
        assert!(can_open(Role::Doctor, Panel::Dashboard));
        assert!(can_open(Role::Doctor, Panel::Billing));
        assert!(!can_open(Role::Radiologist, Panel::Billing));
        assert!(can_open(Role::Patient, Panel::Settings));
    }
}
