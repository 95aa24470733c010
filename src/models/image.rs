//! Medical image metadata.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Metadata of an uploaded image; the bytes are fetched on demand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicalImage {
    pub id: i64,
    pub patient_id: i64,
    /// Modality such as `XRAY`, `CT` or `MRI`.
    #[serde(default)]
    pub image_type: Option<String>,
    #[serde(default)]
    pub body_part: Option<String>,
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub uploaded_by: Option<i64>,
    #[serde(default)]
    pub uploaded_at: Option<NaiveDateTime>,
}

impl MedicalImage {
    /// File name to suggest when saving a download.
    pub fn suggested_file_name(&self) -> String {
        self.file_name
            .clone()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| format!("image_{}.dcm", self.id))
    }
}

/// Local file plus metadata to send as a multipart upload.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub path: PathBuf,
    pub patient_id: i64,
    pub image_type: String,
    pub body_part: Option<String>,
    pub tag: Option<String>,
    pub description: Option<String>,
}

impl ImageUpload {
    pub fn validate(&self) -> crate::Result<()> {
        if self.image_type.trim().is_empty() {
            return Err(crate::AppError::validation("Image type is required"));
        }
        if !self.path.is_file() {
            return Err(crate::AppError::validation(format!(
                "File not found: {}",
                self.path.display()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suggested_file_name() {
        let mut image: MedicalImage = serde_json::from_str(r#"{"id":5,"patientId":1}"#).unwrap();
        assert_eq!(image.suggested_file_name(), "image_5.dcm");

        image.file_name = Some("chest.png".to_string());
        assert_eq!(image.suggested_file_name(), "chest.png");
    }

    #[test]
    fn test_upload_requires_existing_file() {
        let upload = ImageUpload {
            path: PathBuf::from("/definitely/not/here.png"),
            patient_id: 1,
            image_type: "XRAY".to_string(),
            body_part: None,
            tag: None,
            description: None,
        };
        assert!(upload.validate().is_err());
    }
}
