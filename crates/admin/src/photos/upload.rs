//! Validated photo uploads.

use thiserror::Error;

/// Content types the gallery accepts.
pub const ALLOWED_CONTENT_TYPES: &[&str] = &["image/jpeg", "image/png", "image/webp", "image/gif"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadError {
    #[error("no file was selected")]
    Empty,

    #[error("the file is {size} bytes; the limit is {limit} bytes")]
    TooLarge { size: usize, limit: usize },

    #[error("{0} files are not supported; upload a JPEG, PNG, WebP or GIF image")]
    UnsupportedType(String),
}

/// A file that passed local checks and can be sent to the remote service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoUpload {
    file_name: String,
    content_type: String,
    bytes: Vec<u8>,
}

impl PhotoUpload {
    /// Validate an uploaded file.
    ///
    /// The file name is reduced to its base name; a missing name falls back
    /// to `photo`.
    ///
    /// # Errors
    ///
    /// Returns `UploadError` if the file is empty, larger than `max_bytes`,
    /// or not an accepted image type.
    pub fn new(
        file_name: Option<&str>,
        content_type: Option<&str>,
        bytes: Vec<u8>,
        max_bytes: usize,
    ) -> Result<Self, UploadError> {
        if bytes.is_empty() {
            return Err(UploadError::Empty);
        }
        if bytes.len() > max_bytes {
            return Err(UploadError::TooLarge {
                size: bytes.len(),
                limit: max_bytes,
            });
        }

        let content_type = content_type
            .map(|ct| {
                ct.split(';')
                    .next()
                    .unwrap_or_default()
                    .trim()
                    .to_ascii_lowercase()
            })
            .unwrap_or_default();
        if !ALLOWED_CONTENT_TYPES.contains(&content_type.as_str()) {
            let shown = if content_type.is_empty() {
                "Unknown".to_string()
            } else {
                content_type
            };
            return Err(UploadError::UnsupportedType(shown));
        }

        Ok(Self {
            file_name: base_name(file_name.unwrap_or_default()),
            content_type,
            bytes,
        })
    }

    #[must_use]
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    #[must_use]
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Strip any directory components a browser may send.
fn base_name(name: &str) -> String {
    let base = name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();
    if base.is_empty() || base == "." || base == ".." {
        "photo".to_string()
    } else {
        base.to_string()
    }
}
