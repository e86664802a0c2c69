use std::io::ErrorKind;
use std::path::PathBuf;

use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::constants::RECIPE_IMAGE_DIR;
use crate::database::error::ApiError;

/*
Recipe images travel inline as data URIs:

    data:image/<subtype>;base64,<payload>

The decoded payload is stored on disk under the media root and the recipe
row keeps only the relative path.
*/

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub extension: String,
    pub bytes: Vec<u8>,
}

impl TryFrom<&str> for EncodedImage {
    type Error = ApiError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let rest = value.strip_prefix("data:image/").ok_or_else(|| {
            ApiError::Validation("Image must be a data:image/... URI".to_string())
        })?;
        let (subtype, payload) = rest.split_once(";base64,").ok_or_else(|| {
            ApiError::Validation("Image data must be base64 encoded".to_string())
        })?;
        if subtype.is_empty()
            || !subtype
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'+' || b == b'.' || b == b'-')
        {
            return Err(ApiError::Validation(format!(
                "Unknown image type: {subtype}"
            )));
        }
        let bytes = STANDARD
            .decode(payload)
            .map_err(|e| ApiError::Validation(format!("Invalid image encoding: {e}")))?;
        if bytes.is_empty() {
            return Err(ApiError::Validation("Image payload is empty".to_string()));
        }
        Ok(Self {
            extension: subtype.to_string(),
            bytes,
        })
    }
}

/// Filesystem store rooted at the media directory. All returned and
/// accepted paths are relative to the root.
#[derive(Debug, Clone)]
pub struct MediaStore {
    root: PathBuf,
}

impl MediaStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub async fn store_recipe_image(&self, image: &EncodedImage) -> Result<String, ApiError> {
        let relative = format!(
            "{RECIPE_IMAGE_DIR}/{}.{}",
            uuid::Uuid::new_v4().simple(),
            image.extension
        );
        let path = self.root.join(&relative);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| ApiError::Internal(format!("Failed to create media dir: {e}")))?;
        }
        tokio::fs::write(&path, &image.bytes)
            .await
            .map_err(|e| ApiError::Internal(format!("Failed to store media file: {e}")))?;
        Ok(relative)
    }

    /// Removing a file that is already gone is not an error.
    pub async fn remove(&self, relative: &str) -> Result<(), ApiError> {
        check_relative(relative)?;
        match tokio::fs::remove_file(self.root.join(relative)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::warn!("Removing missing media file {relative}");
                Ok(())
            }
            Err(e) => Err(ApiError::Internal(format!(
                "Failed to remove media file: {e}"
            ))),
        }
    }

    pub async fn read(&self, relative: &str) -> Result<Vec<u8>, ApiError> {
        check_relative(relative)?;
        tokio::fs::read(self.root.join(relative))
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => ApiError::NotFound(format!("Media file {relative}")),
                _ => ApiError::Internal(format!("Failed to read media file: {e}")),
            })
    }
}

// Stored paths never contain parent components.
fn check_relative(relative: &str) -> Result<(), ApiError> {
    if relative.split('/').any(|part| part == "..") {
        return Err(ApiError::Validation(format!("Invalid media path: {relative}")));
    }
    Ok(())
}
