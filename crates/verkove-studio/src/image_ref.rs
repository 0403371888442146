//! Dereferencing image references into bytes for an "edit this image" call.
//!
//! Three forms are understood:
//! - `data:<mime>;base64,<payload>` decoded in place
//! - `/uploads/<name>` read from the image store
//! - `http://` or `https://` fetched over the network

use std::time::Duration;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use tracing::{debug, warn};
use verkove_core::images::{mime_for, PUBLIC_PREFIX};
use verkove_core::ImageStore;

use crate::provider::ImageInput;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageRef<'a> {
    Inline { mime: &'a str, payload: &'a str },
    Stored(&'a str),
    Remote(&'a str),
}

impl<'a> ImageRef<'a> {
    pub fn parse(reference: &'a str) -> Option<Self> {
        let reference = reference.trim();
        if let Some(rest) = reference.strip_prefix("data:") {
            let (header, payload) = rest.split_once(',')?;
            let mime = header.strip_suffix(";base64")?;
            return Some(ImageRef::Inline {
                mime: if mime.is_empty() { "image/png" } else { mime },
                payload,
            });
        }
        if let Some(name) = reference.strip_prefix(PUBLIC_PREFIX) {
            return Some(ImageRef::Stored(name));
        }
        if reference.starts_with("http://") || reference.starts_with("https://") {
            return Some(ImageRef::Remote(reference));
        }
        None
    }
}

/// Resolves image references. Failures are logged and yield `None` so the
/// caller can continue text-only.
#[derive(Clone)]
pub struct ImageResolver {
    images: std::sync::Arc<ImageStore>,
    http: reqwest::Client,
    timeout: Duration,
}

impl ImageResolver {
    pub fn new(images: std::sync::Arc<ImageStore>, timeout: Duration) -> Self {
        Self {
            images,
            http: reqwest::Client::new(),
            timeout,
        }
    }

    pub async fn resolve(&self, reference: &str) -> Option<ImageInput> {
        let Some(parsed) = ImageRef::parse(reference) else {
            warn!(reference = %truncate(reference), "unrecognised image reference; continuing text-only");
            return None;
        };
        match self.load(parsed).await {
            Ok(image) => {
                debug!(mime = %image.mime, bytes = image.bytes.len(), "reference image loaded");
                Some(image)
            }
            Err(e) => {
                warn!(reference = %truncate(reference), error = %e, "reference image unreadable; continuing text-only");
                None
            }
        }
    }

    async fn load(&self, parsed: ImageRef<'_>) -> Result<ImageInput, String> {
        match parsed {
            ImageRef::Inline { mime, payload } => {
                let bytes = BASE64
                    .decode(payload.trim())
                    .map_err(|e| format!("inline image: {e}"))?;
                Ok(ImageInput {
                    mime: mime.to_string(),
                    bytes,
                })
            }
            ImageRef::Stored(name) => {
                let bytes = self
                    .images
                    .read_async(name)
                    .await
                    .map_err(|e| e.to_string())?;
                Ok(ImageInput {
                    mime: mime_for(name),
                    bytes,
                })
            }
            ImageRef::Remote(url) => {
                tokio::time::timeout(self.timeout, self.fetch(url))
                    .await
                    .map_err(|_| format!("fetch timed out after {:?}", self.timeout))?
            }
        }
    }

    async fn fetch(&self, url: &str) -> Result<ImageInput, String> {
        let response = self.http.get(url).send().await.map_err(|e| e.to_string())?;
        let status = response.status();
        if !status.is_success() {
            return Err(format!("HTTP {status}"));
        }
        let mime = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.split(';').next().unwrap_or(v).trim().to_string())
            .filter(|v| v.starts_with("image/"))
            .unwrap_or_else(|| mime_for(url.split('?').next().unwrap_or(url)));
        let bytes = response.bytes().await.map_err(|e| e.to_string())?;
        Ok(ImageInput {
            mime,
            bytes: bytes.to_vec(),
        })
    }
}

fn truncate(reference: &str) -> &str {
    match reference.char_indices().nth(64) {
        Some((end, _)) => &reference[..end],
        None => reference,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn references_are_classified() {
        assert_eq!(
            ImageRef::parse("data:image/jpeg;base64,AAAA"),
            Some(ImageRef::Inline {
                mime: "image/jpeg",
                payload: "AAAA"
            })
        );
        assert_eq!(
            ImageRef::parse("/uploads/design-01.png"),
            Some(ImageRef::Stored("design-01.png"))
        );
        assert_eq!(
            ImageRef::parse("https://images.unsplash.com/photo-1"),
            Some(ImageRef::Remote("https://images.unsplash.com/photo-1"))
        );
        assert_eq!(ImageRef::parse("data:text/plain,hello"), None);
        assert_eq!(ImageRef::parse("ftp://example.com/a.png"), None);
    }

    #[tokio::test]
    async fn inline_and_stored_images_resolve() {
        let dir = tempfile::tempdir().unwrap();
        let images = Arc::new(ImageStore::new(dir.path()));
        let stored = images.save("upload", b"jpeg-bytes", "image/jpeg").unwrap();
        let resolver = ImageResolver::new(images, Duration::from_secs(1));

        let inline = resolver.resolve("data:image/png;base64,aGVsbG8=").await.unwrap();
        assert_eq!(inline.mime, "image/png");
        assert_eq!(inline.bytes, b"hello");

        let from_store = resolver.resolve(&stored).await.unwrap();
        assert_eq!(from_store.mime, "image/jpeg");
        assert_eq!(from_store.bytes, b"jpeg-bytes");
    }

    #[tokio::test]
    async fn unreadable_references_yield_none() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = ImageResolver::new(Arc::new(ImageStore::new(dir.path())), Duration::from_secs(1));
        assert!(resolver.resolve("/uploads/missing.png").await.is_none());
        assert!(resolver.resolve("/uploads/../etc/passwd").await.is_none());
        assert!(resolver.resolve("data:image/png;base64,***").await.is_none());
        assert!(resolver.resolve("not a reference").await.is_none());
    }
}
