use axum::extract::Multipart;
use futures::StreamExt;
use std::collections::HashMap;
use uuid::Uuid;

use crate::error::ApiError;
use crate::services::media::{MediaError, MediaKind, MediaStorage};

/// Collects missing required fields so one response can name all of them
#[derive(Debug, Default)]
pub struct RequiredFields {
    missing: HashMap<String, String>,
}

impl RequiredFields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the trimmed value, or records the field as missing
    pub fn take(&mut self, field: &str, value: Option<String>) -> String {
        self.text(field, value).trim().to_string()
    }

    /// Like `take`, but free text is returned exactly as sent
    pub fn text(&mut self, field: &str, value: Option<String>) -> String {
        match non_blank(value) {
            Some(v) => v,
            None => {
                self.missing
                    .insert(field.to_string(), "This field is required".to_string());
                String::new()
            }
        }
    }

    pub fn finish(self) -> Result<(), ApiError> {
        if self.missing.is_empty() {
            return Ok(());
        }
        let mut names: Vec<&str> = self.missing.keys().map(String::as_str).collect();
        names.sort_unstable();
        let message = format!("Missing required fields: {}", names.join(", "));
        Err(ApiError::validation_error(message, Some(self.missing)))
    }
}

/// Drops whitespace-only values without touching the rest
pub fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Parse a document id from a path segment
pub fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw.trim()).map_err(|_| {
        let mut fields = HashMap::new();
        fields.insert("id".to_string(), "Must be a valid identifier".to_string());
        ApiError::validation_error(format!("Invalid id: {}", raw), Some(fields))
    })
}

/// A file part already written to media storage
#[derive(Debug)]
pub struct UploadedFile {
    pub content_type: Option<String>,
    pub url: String,
    pub size: u64,
}

/// Text fields plus at most one stored file
#[derive(Debug, Default)]
pub struct UploadForm {
    pub fields: HashMap<String, String>,
    pub file: Option<UploadedFile>,
}

impl UploadForm {
    pub fn field(&self, name: &str) -> Option<String> {
        self.fields.get(name).cloned()
    }

    /// Remove the stored file of a form that will not be saved
    pub async fn discard(&self, media: &MediaStorage) {
        if let Some(file) = &self.file {
            media.discard(&file.url).await;
        }
    }
}

/// Drain a multipart body. The part named `file_field` is streamed to
/// storage as `kind`; on error nothing stays on disk.
pub async fn read_upload(
    multipart: Multipart,
    file_field: &str,
    media: &MediaStorage,
    kind: MediaKind,
) -> Result<UploadForm, ApiError> {
    let mut form = UploadForm::default();
    match drain_upload(multipart, file_field, media, kind, &mut form).await {
        Ok(()) => Ok(form),
        Err(e) => {
            form.discard(media).await;
            Err(e)
        }
    }
}

async fn drain_upload(
    mut multipart: Multipart,
    file_field: &str,
    media: &MediaStorage,
    kind: MediaKind,
    form: &mut UploadForm,
) -> Result<(), ApiError> {
    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        if name == file_field {
            let file_name = field.file_name().unwrap_or("upload").to_string();
            let content_type = field.content_type().map(str::to_string);
            let chunks = field.map(|chunk| chunk.map_err(|e| MediaError::Body(e.body_text())));
            let stored = media.store_stream(kind, &file_name, chunks).await?;
            if stored.size == 0 {
                media.discard(&stored.url).await;
                continue;
            }
            let file = UploadedFile {
                content_type,
                url: stored.url,
                size: stored.size,
            };
            // a repeated file part replaces the earlier one
            if let Some(previous) = form.file.replace(file) {
                media.discard(&previous.url).await;
            }
        } else if !name.is_empty() {
            let value = field.text().await?;
            form.fields.insert(name, value);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_fields_reports_every_missing_field() {
        let mut required = RequiredFields::new();
        let name = required.take("name", Some(" Ana ".to_string()));
        required.take("email", None);
        required.take("roll", Some("   ".to_string()));

        assert_eq!(name, "Ana");
        let err = required.finish().unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.message(), "Missing required fields: email, roll");
    }

    #[test]
    fn free_text_keeps_surrounding_whitespace() {
        let mut required = RequiredFields::new();
        let body = required.text("message", Some("    fn main() {}\n".to_string()));
        required.text("note", Some(" \n\t".to_string()));

        assert_eq!(body, "    fn main() {}\n");
        assert_eq!(required.finish().unwrap_err().message(), "Missing required fields: note");
        assert_eq!(non_blank(Some("  x ".to_string())).as_deref(), Some("  x "));
        assert_eq!(non_blank(Some("   ".to_string())), None);
    }

    #[test]
    fn parse_id_rejects_malformed_ids() {
        assert!(parse_id("not-an-id").is_err());
        let id = Uuid::new_v4();
        assert_eq!(parse_id(&id.to_string()).unwrap(), id);
    }
}
