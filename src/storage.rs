use crate::config::StorageConfig;
use crate::error::CaptureError;
use crate::permissions::LEGACY_STORAGE_MAX_API_LEVEL;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::fs;
use tracing::{debug, info};

pub const MIME_JPEG: &str = "image/jpeg";
pub const MIME_MP4: &str = "video/mp4";

/// Shared media collection a capture is inserted into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaCollection {
    Images,
    Video,
}

impl MediaCollection {
    /// Directory used when a target carries no relative path
    pub fn default_directory(&self) -> &'static str {
        match self {
            MediaCollection::Images => "Pictures",
            MediaCollection::Video => "Movies",
        }
    }

    fn uri_segment(&self) -> &'static str {
        match self {
            MediaCollection::Images => "images",
            MediaCollection::Video => "video",
        }
    }
}

/// Where a single capture or recording will be saved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputTarget {
    pub display_name: String,
    pub mime_type: &'static str,
    pub collection: MediaCollection,
    pub relative_path: Option<String>,
}

impl OutputTarget {
    pub fn extension(&self) -> &'static str {
        match self.mime_type {
            MIME_JPEG => "jpg",
            MIME_MP4 => "mp4",
            _ => "bin",
        }
    }

    /// Directory relative to the storage root
    pub fn directory(&self) -> &str {
        self.relative_path
            .as_deref()
            .unwrap_or_else(|| self.collection.default_directory())
    }
}

/// Identifier of a saved capture
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedLocation {
    pub uri: String,
    pub path: PathBuf,
}

impl fmt::Display for SavedLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.uri)
    }
}

/// Builds timestamped output targets for photos and videos
#[derive(Debug, Clone)]
pub struct OutputTargetFactory {
    filename_format: String,
    picture_path: String,
    movie_path: String,
    api_level: u32,
}

impl OutputTargetFactory {
    pub fn new(config: &StorageConfig, api_level: u32) -> Self {
        Self {
            filename_format: config.filename_format.clone(),
            picture_path: config.picture_path.clone(),
            movie_path: config.movie_path.clone(),
            api_level,
        }
    }

    pub fn photo(&self) -> OutputTarget {
        self.photo_at(Local::now())
    }

    pub fn video(&self) -> OutputTarget {
        self.video_at(Local::now())
    }

    pub fn photo_at(&self, now: DateTime<Local>) -> OutputTarget {
        self.build(now, MIME_JPEG, MediaCollection::Images, &self.picture_path)
    }

    pub fn video_at(&self, now: DateTime<Local>) -> OutputTarget {
        self.build(now, MIME_MP4, MediaCollection::Video, &self.movie_path)
    }

    fn build(
        &self,
        now: DateTime<Local>,
        mime_type: &'static str,
        collection: MediaCollection,
        relative_path: &str,
    ) -> OutputTarget {
        // Legacy platforms do not accept a relative path
        let relative_path =
            (self.api_level > LEGACY_STORAGE_MAX_API_LEVEL).then(|| relative_path.to_string());

        OutputTarget {
            display_name: now.format(&self.filename_format).to_string(),
            mime_type,
            collection,
            relative_path,
        }
    }
}

/// Media store backed by a directory tree
pub struct FileMediaStore {
    root: PathBuf,
    next_id: AtomicU64,
}

impl FileMediaStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Insert a new entry for `target` and write its contents
    pub async fn write(
        &self,
        target: &OutputTarget,
        contents: &[u8],
    ) -> Result<SavedLocation, CaptureError> {
        let dir = self.root.join(target.directory());
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| storage_error(&dir, e))?;

        let path = unique_path(&dir, &target.display_name, target.extension()).await;
        fs::write(&path, contents)
            .await
            .map_err(|e| storage_error(&path, e))?;

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let location = SavedLocation {
            uri: format!(
                "content://media/external/{}/media/{}",
                target.collection.uri_segment(),
                id
            ),
            path,
        };

        info!(
            "Saved {} ({} bytes) to {}",
            location.uri,
            contents.len(),
            location.path.display()
        );
        Ok(location)
    }
}

fn storage_error(path: &Path, e: std::io::Error) -> CaptureError {
    CaptureError::Storage {
        path: path.display().to_string(),
        details: e.to_string(),
    }
}

/// Append " (n)" to the name until nothing exists at the path
async fn unique_path(dir: &Path, name: &str, extension: &str) -> PathBuf {
    let mut candidate = dir.join(format!("{}.{}", name, extension));
    let mut n = 1;
    while fs::try_exists(&candidate).await.unwrap_or(false) {
        debug!("{} exists, trying next name", candidate.display());
        candidate = dir.join(format!("{} ({}).{}", name, n, extension));
        n += 1;
    }
    candidate
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use chrono::TimeZone;

    fn fixed_time() -> DateTime<Local> {
        Local
            .with_ymd_and_hms(2024, 3, 9, 14, 5, 7)
            .single()
            .unwrap()
    }

    #[test]
    fn test_photo_target_modern_platform() {
        let config = AppConfig::default();
        let factory = OutputTargetFactory::new(&config.storage, 34);
        let target = factory.photo_at(fixed_time());

        assert_eq!(target.display_name, "2024-03-09-14-05-07-000");
        assert_eq!(target.mime_type, MIME_JPEG);
        assert_eq!(target.collection, MediaCollection::Images);
        assert_eq!(target.relative_path.as_deref(), Some("Pictures/CameraX-Image"));
        assert_eq!(target.extension(), "jpg");
    }

    #[test]
    fn test_video_target_legacy_platform_has_no_relative_path() {
        let config = AppConfig::default();
        let factory = OutputTargetFactory::new(&config.storage, 28);
        let target = factory.video_at(fixed_time());

        assert_eq!(target.mime_type, MIME_MP4);
        assert_eq!(target.collection, MediaCollection::Video);
        assert_eq!(target.relative_path, None);
        assert_eq!(target.directory(), "Movies");
    }

    #[tokio::test]
    async fn test_store_writes_and_deduplicates_names() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileMediaStore::new(dir.path());
        let config = AppConfig::default();
        let factory = OutputTargetFactory::new(&config.storage, 34);
        let target = factory.photo_at(fixed_time());

        let first = store.write(&target, b"one").await.unwrap();
        let second = store.write(&target, b"two").await.unwrap();

        assert_ne!(first.path, second.path);
        assert_ne!(first.uri, second.uri);
        assert!(first.uri.starts_with("content://media/external/images/media/"));
        assert!(second
            .path
            .to_string_lossy()
            .ends_with("2024-03-09-14-05-07-000 (1).jpg"));
        assert_eq!(tokio::fs::read(&first.path).await.unwrap(), b"one");
        assert!(first
            .path
            .starts_with(dir.path().join("Pictures/CameraX-Image")));
    }
}
