//! Blob storage for generated and uploaded images.
//!
//! Images are plain files under one directory and are addressed publicly as
//! `/uploads/<name>`. Only the reference is ever stored on an entity.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::StoreError;

/// Public URL prefix under which stored images are served.
pub const PUBLIC_PREFIX: &str = "/uploads/";

#[derive(Debug, Clone)]
pub struct ImageStore {
    root: PathBuf,
}

impl ImageStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write `bytes` under a fresh name and return its public reference.
    ///
    /// Uses atomic write (temp file + rename) so a concurrent reader never
    /// sees a partially written image.
    pub fn save(&self, prefix: &str, bytes: &[u8], mime: &str) -> Result<String, StoreError> {
        fs::create_dir_all(&self.root)?;
        let name = format!(
            "{}-{}.{}",
            prefix,
            ulid::Ulid::new().to_string().to_lowercase(),
            extension_for(mime)
        );
        let tmp = self.root.join(format!(".{name}.tmp"));
        let path = self.root.join(&name);
        fs::write(&tmp, bytes)?;
        fs::rename(&tmp, &path)?;
        debug!(file = %name, bytes = bytes.len(), "image stored");
        Ok(format!("{PUBLIC_PREFIX}{name}"))
    }

    /// Read a stored image by file name.
    pub fn read(&self, name: &str) -> Result<Vec<u8>, StoreError> {
        validate_name(name)?;
        let path = self.root.join(name);
        if !path.is_file() {
            return Err(StoreError::ImageNotFound(name.to_string()));
        }
        Ok(fs::read(path)?)
    }

    /// Read a stored image by its public reference (`/uploads/<name>`).
    pub fn read_reference(&self, reference: &str) -> Result<Vec<u8>, StoreError> {
        let name = reference
            .strip_prefix(PUBLIC_PREFIX)
            .ok_or_else(|| StoreError::InvalidImageName(reference.to_string()))?;
        self.read(name)
    }

    /// [`save`](Self::save) on the blocking pool, for async callers.
    pub async fn save_async(
        &self,
        prefix: &str,
        bytes: Vec<u8>,
        mime: &str,
    ) -> Result<String, StoreError> {
        let store = self.clone();
        let prefix = prefix.to_string();
        let mime = mime.to_string();
        tokio::task::spawn_blocking(move || store.save(&prefix, &bytes, &mime))
            .await
            .map_err(|e| StoreError::Io(io::Error::other(e)))?
    }

    /// [`read`](Self::read) on the blocking pool, for async callers.
    pub async fn read_async(&self, name: &str) -> Result<Vec<u8>, StoreError> {
        let store = self.clone();
        let name = name.to_string();
        tokio::task::spawn_blocking(move || store.read(&name))
            .await
            .map_err(|e| StoreError::Io(io::Error::other(e)))?
    }
}

/// Mime type of a stored image, guessed from its extension.
pub fn mime_for(name: &str) -> String {
    mime_guess::from_path(name)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

fn extension_for(mime: &str) -> &'static str {
    match mime {
        "image/jpeg" | "image/jpg" => "jpg",
        "image/gif" => "gif",
        "image/webp" => "webp",
        "image/svg+xml" => "svg",
        _ => "png",
    }
}

fn validate_name(name: &str) -> Result<(), StoreError> {
    let ok = !name.is_empty()
        && !name.starts_with('.')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if ok {
        Ok(())
    } else {
        Err(StoreError::InvalidImageName(name.to_string()))
    }
}
