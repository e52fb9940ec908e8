use axum::extract::Multipart;
use tracing::debug;

use crate::errors::AppError;

/// Multipart field names accepted for the document payload.
const FILE_FIELDS: &[&str] = &["file", "resume"];

/// A file pulled out of a multipart upload, before media type resolution.
#[derive(Debug)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

/// Reads the first file field out of a multipart form. Other fields are drained
/// and ignored.
pub async fn read_uploaded_file(mut multipart: Multipart) -> Result<UploadedFile, AppError> {
    let mut file: Option<UploadedFile> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Failed to read form field: {e}")))?
    {
        let name = field.name().unwrap_or("").to_string();

        if file.is_none() && FILE_FIELDS.contains(&name.as_str()) {
            let file_name = field.file_name().unwrap_or("upload").to_string();
            let content_type = field.content_type().map(str::to_string);
            let data = field
                .bytes()
                .await
                .map_err(|e| AppError::Validation(format!("Failed to read file data: {e}")))?
                .to_vec();
            file = Some(UploadedFile {
                file_name,
                content_type,
                data,
            });
        } else {
            debug!(field = %name, "ignoring multipart field");
            let _ = field.bytes().await;
        }
    }

    let file = file.ok_or_else(|| {
        AppError::Validation("Multipart form must contain a 'file' field".to_string())
    })?;
    if file.data.is_empty() {
        return Err(AppError::Validation(format!("'{}' is empty", file.file_name)));
    }
    Ok(file)
}
