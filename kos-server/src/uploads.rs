//! Image uploads stored on local disk and served under `/uploads`

use axum::extract::Multipart;
use shared::error::{AppError, ErrorCode};
use std::collections::HashMap;
use std::path::PathBuf;

/// Maximum upload size (5MB)
pub const MAX_FILE_SIZE: usize = 5 * 1024 * 1024;

const SUPPORTED_FORMATS: &[&str] = &["png", "jpg", "jpeg", "webp"];

#[derive(Debug, Clone)]
pub struct UploadStore {
    dir: PathBuf,
    public_prefix: String,
}

impl UploadStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            public_prefix: "/uploads".to_string(),
        }
    }

    pub fn dir(&self) -> &PathBuf {
        &self.dir
    }

    /// Validate and store an image; returns its public URL
    /// (`/uploads/{category}/{uuid}.{ext}`).
    pub async fn save_image(&self, category: &str, data: &[u8], filename: &str) -> Result<String, AppError> {
        let ext = validate_image(data, filename)?;

        let category = sanitize_category(category);
        let dir = self.dir.join(&category);
        tokio::fs::create_dir_all(&dir).await.map_err(storage_error)?;

        let file_name = format!("{}.{ext}", uuid::Uuid::new_v4());
        tokio::fs::write(dir.join(&file_name), data)
            .await
            .map_err(storage_error)?;

        tracing::info!(category = %category, file = %file_name, size = data.len(), "Image stored");
        Ok(format!("{}/{category}/{file_name}", self.public_prefix))
    }

    /// Delete a file previously returned by [`save_image`](Self::save_image).
    /// Best effort: failures are logged.
    pub async fn remove(&self, url: &str) {
        let Some(relative) = url
            .strip_prefix(&self.public_prefix)
            .and_then(|r| r.strip_prefix('/'))
        else {
            return;
        };
        if relative.split('/').any(|part| part == "..") {
            return;
        }
        let path = self.dir.join(relative);
        if let Err(e) = tokio::fs::remove_file(&path).await {
            tracing::warn!(path = %path.display(), error = %e, "Failed to remove stored file");
        }
    }
}

/// Check size, extension and that the bytes decode as an image.
/// Returns the normalized extension.
pub fn validate_image(data: &[u8], filename: &str) -> Result<String, AppError> {
    if data.is_empty() {
        return Err(AppError::new(ErrorCode::EmptyFile));
    }
    if data.len() > MAX_FILE_SIZE {
        return Err(AppError::with_message(
            ErrorCode::FileTooLarge,
            format!("File too large: {} bytes (max {MAX_FILE_SIZE})", data.len()),
        ));
    }

    let ext = std::path::Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();
    if !SUPPORTED_FORMATS.contains(&ext.as_str()) {
        return Err(AppError::with_message(
            ErrorCode::UnsupportedFileFormat,
            format!("Unsupported format: {ext}. Supported: png, jpg, jpeg, webp"),
        ));
    }
    let mime = mime_guess::from_ext(&ext).first_or_octet_stream();
    if mime.type_() != mime_guess::mime::IMAGE {
        return Err(AppError::new(ErrorCode::UnsupportedFileFormat));
    }

    image::load_from_memory(data).map_err(|e| {
        AppError::with_message(ErrorCode::InvalidImageFile, format!("Invalid image: {e}"))
    })?;

    Ok(if ext == "jpeg" { "jpg".to_string() } else { ext })
}

fn sanitize_category(category: &str) -> String {
    let clean: String = category
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect();
    if clean.is_empty() { "misc".to_string() } else { clean }
}

fn storage_error(e: std::io::Error) -> AppError {
    tracing::error!(error = %e, "Failed to store upload");
    AppError::new(ErrorCode::FileStorageFailed)
}

/// File part of a multipart form
#[derive(Debug)]
pub struct UploadedFile {
    pub filename: String,
    pub data: Vec<u8>,
}

/// Multipart form split into its (single) file and text fields
#[derive(Debug, Default)]
pub struct MultipartForm {
    pub file: Option<UploadedFile>,
    pub fields: HashMap<String, String>,
}

impl MultipartForm {
    /// Read every part; the first part with a filename is the file
    pub async fn read(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut form = Self::default();
        while let Some(field) = multipart.next_field().await.map_err(|e| {
            AppError::with_message(ErrorCode::InvalidRequest, format!("Multipart error: {e}"))
        })? {
            let name = field.name().unwrap_or_default().to_string();
            match field.file_name().map(str::to_string) {
                Some(filename) if form.file.is_none() => {
                    let data = field.bytes().await.map_err(|e| {
                        AppError::with_message(ErrorCode::InvalidRequest, format!("Read error: {e}"))
                    })?;
                    form.file = Some(UploadedFile {
                        filename,
                        data: data.to_vec(),
                    });
                }
                _ => {
                    let text = field.text().await.map_err(|e| {
                        AppError::with_message(ErrorCode::InvalidRequest, format!("Read error: {e}"))
                    })?;
                    form.fields.insert(name, text);
                }
            }
        }
        Ok(form)
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str).filter(|s| !s.is_empty())
    }

    pub fn require_field(&self, name: &str) -> Result<&str, AppError> {
        self.field(name).ok_or_else(|| {
            AppError::with_message(ErrorCode::RequiredField, format!("{name} is required"))
        })
    }

    pub fn take_file(&mut self) -> Result<UploadedFile, AppError> {
        self.file.take().ok_or_else(|| AppError::new(ErrorCode::NoFileProvided))
    }
}
