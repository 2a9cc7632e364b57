//! Product image storage on local disk
//!
//! Files are written as `<unix-millis><ext>` into the upload directory and
//! served back under `/uploads`.

use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use chrono::Utc;
use tokio::{fs, io::AsyncWriteExt};
use tracing::{info, warn};

/// Public URL prefix the upload directory is mounted at
pub const UPLOADS_ROUTE: &str = "/uploads";

/// A file written by [`ImageStore::save`]
#[derive(Debug, Clone, PartialEq)]
pub struct StoredImage {
    pub path: PathBuf,
    /// Path recorded on the product, e.g. `/uploads/1717000000000.jpg`
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct ImageStore {
    dir: PathBuf,
}

impl ImageStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write `bytes` under a fresh timestamped name, keeping the original extension
    pub async fn save(&self, original_name: Option<&str>, bytes: &[u8]) -> std::io::Result<StoredImage> {
        fs::create_dir_all(&self.dir).await?;

        let ext = extension(original_name);
        let mut stamp = Utc::now().timestamp_millis();

        loop {
            let file_name = format!("{}{}", stamp, ext);
            let path = self.dir.join(&file_name);

            match fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(mut file) => {
                    file.write_all(bytes).await?;
                    file.flush().await?;
                    info!("Stored upload {}", path.display());
                    return Ok(StoredImage {
                        path,
                        url: format!("{}/{}", UPLOADS_ROUTE, file_name),
                    });
                }
                // Two uploads in the same millisecond
                Err(e) if e.kind() == ErrorKind::AlreadyExists => stamp += 1,
                Err(e) => return Err(e),
            }
        }
    }

    /// Best-effort removal of a stored file
    pub async fn remove(&self, image: &StoredImage) {
        if let Err(e) = fs::remove_file(&image.path).await {
            warn!("Failed to remove upload {}: {}", image.path.display(), e);
        }
    }

    /// Best-effort removal of the file behind an `/uploads/<name>` URL.
    ///
    /// URLs outside the upload route, or naming anything but a plain file in
    /// the upload directory, are left alone.
    pub async fn remove_url(&self, url: &str) {
        let Some(path) = self.path_for_url(url) else {
            return;
        };
        match fs::remove_file(&path).await {
            Ok(()) => info!("Removed upload {}", path.display()),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to remove upload {}: {}", path.display(), e),
        }
    }

    fn path_for_url(&self, url: &str) -> Option<PathBuf> {
        let name = url.strip_prefix(UPLOADS_ROUTE)?.strip_prefix('/')?;
        let is_plain = !name.is_empty()
            && !name.contains(['/', '\\'])
            && Path::new(name).file_name().is_some_and(|f| f == name);
        is_plain.then(|| self.dir.join(name))
    }
}

/// `.ext` of the client-supplied file name, restricted to ASCII alphanumerics
fn extension(original_name: Option<&str>) -> String {
    original_name
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.len() <= 8 && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|ext| format!(".{}", ext.to_lowercase()))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension() {
        assert_eq!(extension(Some("photo.JPG")), ".jpg");
        assert_eq!(extension(Some("archive.tar.gz")), ".gz");
        assert_eq!(extension(Some("noext")), "");
        assert_eq!(extension(Some("evil.p/h")), "");
        assert_eq!(extension(None), "");
    }

    #[tokio::test]
    async fn test_save_and_remove() {
        let dir = tempfile::tempdir().unwrap();
        let store = ImageStore::new(dir.path().join("uploads"));

        let first = store.save(Some("a.png"), b"one").await.unwrap();
        let second = store.save(Some("b.png"), b"two").await.unwrap();

        assert_ne!(first.path, second.path);
        assert!(first.url.starts_with("/uploads/"));
        assert!(first.url.ends_with(".png"));
        assert_eq!(fs::read(&second.path).await.unwrap(), b"two");

        store.remove(&first).await;
        assert!(!first.path.exists());
        assert!(second.path.exists());

        store.remove_url(&second.url).await;
        assert!(!second.path.exists());
        // Already gone
        store.remove_url(&second.url).await;
    }

    #[tokio::test]
    async fn test_remove_url_stays_in_upload_dir() {
        let dir = tempfile::tempdir().unwrap();
        let store = ImageStore::new(dir.path().join("uploads"));
        let outside = dir.path().join("keep.png");
        std::fs::write(&outside, b"keep").unwrap();

        for url in [
            "/uploads/../keep.png",
            "/uploads/..",
            "/uploads/",
            "/static/keep.png",
            "https://cdn.example.com/keep.png",
        ] {
            assert_eq!(store.path_for_url(url), None, "{}", url);
            store.remove_url(url).await;
        }
        assert!(outside.exists());

        assert_eq!(
            store.path_for_url("/uploads/1717000000000.jpg"),
            Some(dir.path().join("uploads").join("1717000000000.jpg"))
        );
    }
}
