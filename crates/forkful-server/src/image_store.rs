//! Object storage for restaurant photos.
//!
//! Uploads are written to a flat directory under a generated name
//! `<uuid>.<ext>` and served back at `{public_base_url}/images/<name>`.
//! Only names of that exact shape are ever turned into paths, so a request
//! cannot reach outside the directory.

use std::path::PathBuf;

use image::ImageFormat;
use serde::Serialize;
use tokio::fs;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::ServerError;

/// Image formats accepted for upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Jpeg,
    Png,
    WebP,
}

impl ImageKind {
    /// Detect the format from the file's magic bytes.
    pub fn sniff(data: &[u8]) -> Result<Self, ServerError> {
        match image::guess_format(data) {
            Ok(ImageFormat::Jpeg) => Ok(Self::Jpeg),
            Ok(ImageFormat::Png) => Ok(Self::Png),
            Ok(ImageFormat::WebP) => Ok(Self::WebP),
            _ => Err(ServerError::UnsupportedImage),
        }
    }

    fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            "webp" => Some(Self::WebP),
            _ => None,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::WebP => "webp",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::WebP => "image/webp",
        }
    }
}

/// A generated object name: `<uuid>.<ext>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageName {
    id: Uuid,
    kind: ImageKind,
}

impl ImageName {
    fn generate(kind: ImageKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
        }
    }

    /// Accept only names this store could have generated.
    pub fn parse(name: &str) -> Option<Self> {
        let (stem, ext) = name.rsplit_once('.')?;
        let id = Uuid::parse_str(stem).ok()?;
        // Uuid::parse_str also accepts braced and urn forms
        if stem != id.to_string() {
            return None;
        }
        let kind = ImageKind::from_extension(ext)?;
        Some(Self { id, kind })
    }

    pub fn kind(&self) -> ImageKind {
        self.kind
    }
}

impl std::fmt::Display for ImageName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.id, self.kind.extension())
    }
}

/// Result of a successful upload.
#[derive(Debug, Clone, Serialize)]
pub struct StoredImage {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct ImageStore {
    base_path: PathBuf,
    max_size: usize,
    public_base_url: String,
}

impl ImageStore {
    pub async fn new(
        base_path: PathBuf,
        max_size: usize,
        public_base_url: impl Into<String>,
    ) -> Result<Self, ServerError> {
        fs::create_dir_all(&base_path).await.map_err(|e| {
            ServerError::ImageStorage(format!(
                "Failed to create image directory '{}': {}",
                base_path.display(),
                e
            ))
        })?;

        info!(path = %base_path.display(), "Image store initialized");

        Ok(Self {
            base_path,
            max_size,
            public_base_url: public_base_url.into(),
        })
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Validate and write an upload, returning its generated name and
    /// public URL.
    pub async fn store_image(&self, data: &[u8]) -> Result<StoredImage, ServerError> {
        if data.is_empty() {
            return Err(ServerError::BadRequest("Empty upload".to_string()));
        }
        if data.len() > self.max_size {
            return Err(ServerError::ImageTooLarge {
                size: data.len(),
                max: self.max_size,
            });
        }

        let name = ImageName::generate(ImageKind::sniff(data)?);
        let path = self.path_for(&name);

        fs::write(&path, data)
            .await
            .map_err(|e| ServerError::ImageStorage(format!("Failed to write {name}: {e}")))?;

        debug!(name = %name, size = data.len(), "Stored image");
        Ok(StoredImage {
            url: self.public_url(&name),
            name: name.to_string(),
        })
    }

    /// Read a stored image back.
    pub async fn get_image(&self, name: &str) -> Result<(Vec<u8>, ImageKind), ServerError> {
        let name = ImageName::parse(name)
            .ok_or_else(|| ServerError::NotFound(format!("Image {name}")))?;
        let path = self.path_for(&name);

        match fs::read(&path).await {
            Ok(data) => Ok((data, name.kind())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(ServerError::NotFound(format!("Image {name}")))
            }
            Err(e) => Err(ServerError::ImageStorage(format!("Failed to read {name}: {e}"))),
        }
    }

    /// Remove an image that ended up with no owner. Failures are only logged.
    pub async fn discard(&self, name: &str) {
        let Some(name) = ImageName::parse(name) else {
            return;
        };
        match fs::remove_file(self.path_for(&name)).await {
            Ok(()) => debug!(name = %name, "Discarded image"),
            Err(e) => warn!(name = %name, error = %e, "Failed to discard image"),
        }
    }

    pub fn public_url(&self, name: &ImageName) -> String {
        format!("{}/images/{}", self.public_base_url, name)
    }

    fn path_for(&self, name: &ImageName) -> PathBuf {
        self.base_path.join(name.to_string())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use tempfile::TempDir;

    pub(crate) const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR-not-really-a-png";
    pub(crate) const JPEG_BYTES: &[u8] = b"\xFF\xD8\xFF\xE0\0\x10JFIF\0-fake";

    async fn test_store() -> (ImageStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = ImageStore::new(dir.path().to_path_buf(), 1024, "http://localhost:8080")
            .await
            .unwrap();
        (store, dir)
    }

    #[tokio::test]
    async fn test_store_and_get() {
        let (store, _dir) = test_store().await;

        let stored = store.store_image(PNG_BYTES).await.unwrap();
        assert!(stored.name.ends_with(".png"));
        assert_eq!(
            stored.url,
            format!("http://localhost:8080/images/{}", stored.name)
        );

        let (data, kind) = store.get_image(&stored.name).await.unwrap();
        assert_eq!(data, PNG_BYTES);
        assert_eq!(kind.content_type(), "image/png");
    }

    #[tokio::test]
    async fn test_jpeg_extension() {
        let (store, _dir) = test_store().await;
        let stored = store.store_image(JPEG_BYTES).await.unwrap();
        assert!(stored.name.ends_with(".jpg"));
    }

    #[tokio::test]
    async fn test_rejects_non_images() {
        let (store, _dir) = test_store().await;
        assert!(matches!(
            store.store_image(b"just some text").await,
            Err(ServerError::UnsupportedImage)
        ));
        assert!(matches!(
            store.store_image(b"").await,
            Err(ServerError::BadRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_rejects_oversized() {
        let (store, _dir) = test_store().await;
        let mut big = PNG_BYTES.to_vec();
        big.resize(2048, 0);
        assert!(matches!(
            store.store_image(&big).await,
            Err(ServerError::ImageTooLarge { size: 2048, max: 1024 })
        ));
    }

    #[tokio::test]
    async fn test_get_rejects_foreign_names() {
        let (store, _dir) = test_store().await;
        for name in ["../etc/passwd", "abc.png", "x", "{00000000-0000-0000-0000-000000000000}.png"] {
            assert!(matches!(
                store.get_image(name).await,
                Err(ServerError::NotFound(_))
            ));
        }
        let missing = format!("{}.png", Uuid::new_v4());
        assert!(matches!(
            store.get_image(&missing).await,
            Err(ServerError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_discard() {
        let (store, _dir) = test_store().await;
        let stored = store.store_image(PNG_BYTES).await.unwrap();

        store.discard(&stored.name).await;
        assert!(matches!(
            store.get_image(&stored.name).await,
            Err(ServerError::NotFound(_))
        ));

        // Unknown and foreign names are ignored
        store.discard(&stored.name).await;
        store.discard("../escape.png").await;
    }

    #[test]
    fn test_name_round_trip() {
        let name = ImageName::generate(ImageKind::WebP);
        assert_eq!(ImageName::parse(&name.to_string()), Some(name));
        assert_eq!(ImageName::parse("11111111-2222-3333-4444-555555555555.gif"), None);
    }
}
