use chrono::{DateTime, Utc};
use futures::{Stream, StreamExt};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

/// URL prefix under which stored files are served
pub const PUBLIC_PREFIX: &str = "/uploads";

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Path is outside the uploads directory: {0}")]
    InvalidPath(String),

    #[error("Upload body could not be read: {0}")]
    Body(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Video,
    Assignment,
}

impl MediaKind {
    pub fn directory(&self) -> &'static str {
        match self {
            MediaKind::Video => "videos",
            MediaKind::Assignment => "assignments",
        }
    }
}

/// Where a stored file ended up
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    pub url: String,
    pub size: u64,
}

/// Local filesystem area for uploaded files, mirrored at `/uploads/...`
#[derive(Debug, Clone)]
pub struct MediaStorage {
    root: Arc<PathBuf>,
}

impl MediaStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Arc::new(root.into()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write `chunks` to a new file as they arrive. A failed write leaves no
    /// partial file behind.
    pub async fn store_stream<S, B, E>(
        &self,
        kind: MediaKind,
        original_name: &str,
        chunks: S,
    ) -> Result<StoredFile, MediaError>
    where
        S: Stream<Item = Result<B, E>>,
        B: AsRef<[u8]>,
        E: Into<MediaError>,
    {
        let dir = self.root.join(kind.directory());
        tokio::fs::create_dir_all(&dir).await?;

        let file_name = storage_name(original_name, Utc::now());
        let path = dir.join(&file_name);
        let url = format!("{}/{}/{}", PUBLIC_PREFIX, kind.directory(), file_name);

        let mut file = tokio::fs::File::create(&path).await?;
        let written = write_chunks(&mut file, chunks).await;
        drop(file);

        match written {
            Ok(size) => {
                info!("Stored {} bytes at {}", size, url);
                Ok(StoredFile { url, size })
            }
            Err(e) => {
                if let Err(cleanup) = tokio::fs::remove_file(&path).await {
                    warn!("Could not remove partial upload {}: {}", path.display(), cleanup);
                }
                Err(e)
            }
        }
    }

    /// Remove a previously stored file; a file that is already gone is not an error
    pub async fn remove(&self, url: &str) -> Result<(), MediaError> {
        let path = self.resolve(url)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                info!("Removed stored file {}", url);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("Stored file {} was already missing", url);
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Remove a file whose record is gone or was never saved. Failures are
    /// logged, not returned.
    pub async fn discard(&self, url: &str) {
        if let Err(e) = self.remove(url).await {
            warn!("Could not remove stored file {}: {}", url, e);
        }
    }

    /// Map a public URL back onto the uploads directory
    fn resolve(&self, url: &str) -> Result<PathBuf, MediaError> {
        let relative = url
            .strip_prefix(PUBLIC_PREFIX)
            .map(|r| r.trim_start_matches('/'))
            .ok_or_else(|| MediaError::InvalidPath(url.to_string()))?;
        let relative = Path::new(relative);
        if relative.as_os_str().is_empty() || relative.components().any(|c| !matches!(c, Component::Normal(_))) {
            return Err(MediaError::InvalidPath(url.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

async fn write_chunks<S, B, E>(file: &mut tokio::fs::File, chunks: S) -> Result<u64, MediaError>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: Into<MediaError>,
{
    let mut chunks = std::pin::pin!(chunks);
    let mut size = 0u64;
    while let Some(chunk) = chunks.next().await {
        let chunk = chunk.map_err(Into::<MediaError>::into)?;
        let chunk = chunk.as_ref();
        file.write_all(chunk).await?;
        size += chunk.len() as u64;
    }
    file.flush().await?;
    Ok(size)
}

/// `<millis>-<sanitized original name>`
pub fn storage_name(original_name: &str, now: DateTime<Utc>) -> String {
    format!("{}-{}", now.timestamp_millis(), sanitize_file_name(original_name))
}

fn sanitize_file_name(original_name: &str) -> String {
    let base = original_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') { c } else { '_' })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned.to_string()
    }
}

/// Whether a declared content type is a video
pub fn is_video(content_type: Option<&str>) -> bool {
    content_type
        .map(|ct| ct.trim().to_ascii_lowercase().starts_with("video/"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn storage_name_prefixes_timestamp() {
        let now = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
        assert_eq!(storage_name("lesson 1.mp4", now), "1700000000123-lesson_1.mp4");
    }

    #[test]
    fn sanitizes_paths_and_hidden_names() {
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("C:\\videos\\intro.mov"), "intro.mov");
        assert_eq!(sanitize_file_name(".."), "file");
        assert_eq!(sanitize_file_name(""), "file");
    }

    #[test]
    fn detects_video_content_types() {
        assert!(is_video(Some("video/mp4")));
        assert!(is_video(Some("Video/WebM")));
        assert!(!is_video(Some("image/png")));
        assert!(!is_video(None));
    }

    #[test]
    fn resolve_rejects_escapes() {
        let storage = MediaStorage::new("/srv/uploads");
        assert_eq!(
            storage.resolve("/uploads/videos/1-a.mp4").unwrap(),
            PathBuf::from("/srv/uploads/videos/1-a.mp4")
        );
        assert!(storage.resolve("/uploads/../secret").is_err());
        assert!(storage.resolve("/elsewhere/a.mp4").is_err());
        assert!(storage.resolve("/uploads/").is_err());
    }

    fn scratch_root() -> PathBuf {
        std::env::temp_dir().join(format!("schoolhub-media-{}", uuid::Uuid::new_v4()))
    }

    #[tokio::test]
    async fn store_then_remove_round_trip() {
        let root = scratch_root();
        let storage = MediaStorage::new(&root);

        let chunks = futures::stream::iter([Ok::<_, MediaError>(&b"%P"[..]), Ok(&b"DF"[..])]);
        let stored = storage.store_stream(MediaKind::Assignment, "brief.pdf", chunks).await.unwrap();
        assert!(stored.url.starts_with("/uploads/assignments/"));
        assert_eq!(stored.size, 4);
        let path = storage.resolve(&stored.url).unwrap();
        assert_eq!(tokio::fs::read(&path).await.unwrap(), b"%PDF");

        storage.remove(&stored.url).await.unwrap();
        assert!(!path.exists());
        // second removal is tolerated
        storage.remove(&stored.url).await.unwrap();

        let _ = tokio::fs::remove_dir_all(&root).await;
    }

    #[tokio::test]
    async fn broken_stream_leaves_no_partial_file() {
        let root = scratch_root();
        let storage = MediaStorage::new(&root);

        let chunks = futures::stream::iter([
            Ok(&b"\x00\x00"[..]),
            Err(MediaError::Body("connection reset".to_string())),
        ]);
        let err = storage.store_stream(MediaKind::Video, "clip.mp4", chunks).await.unwrap_err();
        assert!(matches!(err, MediaError::Body(_)));

        let left = std::fs::read_dir(root.join("videos")).unwrap().count();
        assert_eq!(left, 0);

        let _ = tokio::fs::remove_dir_all(&root).await;
    }

    #[tokio::test]
    async fn discard_swallows_unresolvable_urls() {
        let storage = MediaStorage::new(scratch_root());
        storage.discard("uploads/videos/1-legacy.mp4").await;
        storage.discard("/uploads/videos/never-written.mp4").await;
    }
}
