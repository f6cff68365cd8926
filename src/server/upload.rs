// src/server/upload.rs
use std::io::Write;

use axum::extract::Multipart;
use tempfile::NamedTempFile;

/// Multipart field carrying the document.
pub const FILE_FIELD: &str = "file";

/// An uploaded document spooled to disk. The file is removed on drop.
pub struct UploadedFile {
    pub filename: String,
    pub file: NamedTempFile,
}

/// Reads the `file` field into a temp file, keeping the upload's extension so
/// the right converter is picked later. Other fields are ignored.
pub async fn parse_multipart(mut multipart: Multipart) -> Result<UploadedFile, String> {
    let mut upload: Option<UploadedFile> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| format!("Failed to read form field: {}", e))?
    {
        if field.name() != Some(FILE_FIELD) {
            let _ = field.bytes().await;
            continue;
        }

        let filename = field.file_name().unwrap_or("upload.pdf").to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| format!("Failed to read file data: {}", e))?;

        if data.is_empty() {
            return Err("Uploaded file is empty".to_string());
        }

        let file = spool(&filename, &data).map_err(|e| format!("Failed to write temp file: {}", e))?;
        tracing::info!("Received upload '{}' ({} bytes)", filename, data.len());
        upload = Some(UploadedFile { filename, file });
    }

    upload.ok_or_else(|| "No file uploaded".to_string())
}

fn spool(filename: &str, data: &[u8]) -> std::io::Result<NamedTempFile> {
    let suffix = std::path::Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{}", ext.to_lowercase()))
        .unwrap_or_default();

    let mut file = tempfile::Builder::new().prefix("upload-").suffix(&suffix).tempfile()?;
    file.write_all(data)?;
    file.flush()?;
    Ok(file)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spooled_file_keeps_extension_and_content() {
        let file = spool("Report.PDF", b"%PDF-1.4").unwrap();
        assert_eq!(file.path().extension().and_then(|e| e.to_str()), Some("pdf"));
        assert_eq!(std::fs::read(file.path()).unwrap(), b"%PDF-1.4");

        let plain = spool("noext", b"text").unwrap();
        assert!(plain.path().extension().is_none());
    }
}
