/// Multipart form parsing shared by the upload endpoints
use crate::{
    blob_store::FileUpload,
    error::{WishError, WishResult},
};
use axum::extract::Multipart;
use std::collections::HashMap;

/// Text fields and files read from a multipart body
#[derive(Debug, Default)]
pub struct UploadForm {
    fields: HashMap<String, String>,
    files: HashMap<String, FileUpload>,
}

impl UploadForm {
    /// Drain a multipart body
    ///
    /// A file input submitted without a selected file arrives as an empty
    /// part and is treated as absent.
    pub async fn read(mut multipart: Multipart) -> WishResult<Self> {
        let mut form = Self::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| WishError::Validation(format!("Malformed form data: {}", e)))?
        {
            let name = match field.name() {
                Some(name) => name.to_string(),
                None => continue,
            };

            if let Some(file_name) = field.file_name().map(str::to_string) {
                let content_type = field.content_type().map(str::to_string);
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| WishError::Validation(format!("Failed to read file: {}", e)))?;
                if !data.is_empty() {
                    form.files.insert(
                        name,
                        FileUpload {
                            data: data.to_vec(),
                            content_type,
                            file_name,
                        },
                    );
                }
            } else {
                let text = field
                    .text()
                    .await
                    .map_err(|e| WishError::Validation(format!("Failed to read field: {}", e)))?;
                form.fields.insert(name, text);
            }
        }

        Ok(form)
    }

    /// Text field value, empty when missing
    pub fn text(&self, name: &str) -> String {
        self.fields.get(name).cloned().unwrap_or_default()
    }

    pub fn take_file(&mut self, name: &str) -> Option<FileUpload> {
        self.files.remove(name)
    }
}
