//! Medical staff DTOs.

use serde::{Deserialize, Serialize};

use crate::routing::Role;

/// Doctor, radiologist or administrator record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicalStaff {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: Role,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub specialization: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub license_number: Option<String>,
    #[serde(default)]
    pub user_id: Option<i64>,
}

impl MedicalStaff {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Name with the doctor title where it applies.
    pub fn display_name(&self) -> String {
        match self.role {
            Role::Doctor => format!("Dr. {}", self.full_name()),
            _ => self.full_name(),
        }
    }
}

/// DTO for creating a staff member.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMedicalStaff {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: Role,
    pub phone_number: Option<String>,
    pub specialization: Option<String>,
    pub department: Option<String>,
    pub license_number: Option<String>,
}

/// DTO for updating a staff member.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMedicalStaff {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specialization: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license_number: Option<String>,
}

/// Resolve a staff id to a display name, falling back to `#id`.
pub fn staff_name(staff: &[MedicalStaff], id: Option<i64>) -> String {
    match id {
        Some(id) => staff
            .iter()
            .find(|s| s.id == id)
            .map(|s| s.display_name())
            .unwrap_or_else(|| format!("#{id}")),
        None => "-".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doctor() -> MedicalStaff {
        MedicalStaff {
            id: 4,
            first_name: "Gregory".to_string(),
            last_name: "House".to_string(),
            email: "house@example.org".to_string(),
            role: Role::Doctor,
            phone_number: None,
            specialization: Some("Diagnostics".to_string()),
            department: None,
            license_number: None,
            user_id: None,
        }
    }

    #[test]
    fn test_display_name() {
        assert_eq!(doctor().display_name(), "Dr. Gregory House");
        let mut rad = doctor();
        rad.role = Role::Radiologist;
        assert_eq!(rad.display_name(), "Gregory House");
    }

    #[test]
    fn test_staff_name_lookup() {
        let staff = vec![doctor()];
        assert_eq!(staff_name(&staff, Some(4)), "Dr. Gregory House");
        assert_eq!(staff_name(&staff, Some(9)), "#9");
        assert_eq!(staff_name(&staff, None), "-");
    }

    #[test]
    fn test_deserialize_role() {
        let json = r#"{"id":1,"firstName":"A","lastName":"B","email":"a@b","role":"RADIOLOGIST"}"#;
        let staff: MedicalStaff = serde_json::from_str(json).unwrap();
        assert_eq!(staff.role, Role::Radiologist);
    }

    #[test]
    fn test_staff_list_with_prefixed_roles() {
        let json = r#"[
            {"id":1,"firstName":"A","lastName":"B","email":"a@b","role":"ROLE_DOCTOR"},
            {"id":2,"firstName":"C","lastName":"D","email":"c@d","role":"admin"}
        ]"#;
        let staff: Vec<MedicalStaff> = serde_json::from_str(json).unwrap();
        assert_eq!(staff[0].role, Role::Doctor);
        assert_eq!(staff[1].role, Role::Admin);
    }
}
