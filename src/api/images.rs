//! Medical image endpoints: listing, multipart upload and download.

use std::path::Path;

use reqwest::multipart::{Form, Part};

use super::ApiClient;
use crate::error::Result;
use crate::models::{ImageUpload, MedicalImage};

pub async fn list_all(api: &ApiClient) -> Result<Vec<MedicalImage>> {
    api.get("/images").await
}

pub async fn list_by_patient(api: &ApiClient, patient_id: i64) -> Result<Vec<MedicalImage>> {
    api.get(&format!("/images/patient/{patient_id}")).await
}

/// Upload a local file with its metadata.
pub async fn upload(api: &ApiClient, upload: &ImageUpload) -> Result<MedicalImage> {
    upload.validate()?;

    let bytes = tokio::fs::read(&upload.path).await?;
    let file_name = upload
        .path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "upload.bin".to_string());

    tracing::info!(
        "Uploading {} ({} bytes) for patient {}",
        file_name,
        bytes.len(),
        upload.patient_id
    );

    let part = Part::bytes(bytes)
        .file_name(file_name)
        .mime_str(guess_mime(&upload.path))?;

    let mut form = Form::new()
        .part("file", part)
        .text("patientId", upload.patient_id.to_string())
        .text("imageType", upload.image_type.trim().to_string());

    if let Some(body_part) = non_empty(&upload.body_part) {
        form = form.text("bodyPart", body_part);
    }
    if let Some(tag) = non_empty(&upload.tag) {
        form = form.text("tag", tag);
    }
    if let Some(description) = non_empty(&upload.description) {
        form = form.text("description", description);
    }

    api.post_multipart("/images/upload", form).await
}

/// Download image bytes and write them to `dest`.
pub async fn download_to(api: &ApiClient, image_id: i64, dest: &Path) -> Result<usize> {
    let bytes = api.get_bytes(&format!("/images/{image_id}/download")).await?;
    tokio::fs::write(dest, &bytes).await?;
    tracing::info!("Saved image {} to {:?} ({} bytes)", image_id, dest, bytes.len());
    Ok(bytes.len())
}

pub async fn delete(api: &ApiClient, image_id: i64) -> Result<()> {
    api.delete(&format!("/images/{image_id}")).await
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn guess_mime(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "dcm" => "application/dicom",
        "pdf" => "application/pdf",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::tests::{client_for, serve_once, signed_in};
    use std::path::PathBuf;

    #[test]
    fn test_guess_mime() {
        assert_eq!(guess_mime(Path::new("scan.PNG")), "image/png");
        assert_eq!(guess_mime(Path::new("scan.dcm")), "application/dicom");
        assert_eq!(guess_mime(Path::new("scan")), "application/octet-stream");
    }

    #[test]
    fn test_non_empty() {
        assert_eq!(non_empty(&Some("  chest ".to_string())), Some("chest".to_string()));
        assert_eq!(non_empty(&Some("   ".to_string())), None);
        assert_eq!(non_empty(&None), None);
    }

    #[tokio::test]
    async fn test_download_writes_file() {
        let (base, server) = serve_once("200 OK", "PIXELS").await;
        let api = client_for(&base, signed_in("RADIOLOGIST"));
        let dest = std::env::temp_dir().join(format!("portal_download_{}.bin", std::process::id()));

        let written = download_to(&api, 4, &dest).await.unwrap();
        assert_eq!(written, 6);
        assert_eq!(std::fs::read(&dest).unwrap(), b"PIXELS");
        assert!(server.await.unwrap().starts_with("GET /api/images/4/download "));

        std::fs::remove_file(&dest).ok();
    }

    #[tokio::test]
    async fn test_upload_rejects_missing_file() {
        let api = client_for("http://127.0.0.1:9", signed_in("DOCTOR"));
        let data = ImageUpload {
            path: PathBuf::from("/no/such/file.png"),
            patient_id: 1,
            image_type: "XRAY".to_string(),
            body_part: None,
            tag: None,
            description: None,
        };
        assert!(upload_is_validation_error(upload(&api, &data).await));
    }

    fn upload_is_validation_error(result: Result<MedicalImage>) -> bool {
        matches!(result, Err(crate::AppError::Validation(_)))
    }
}
