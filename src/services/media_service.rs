//! Media upload stage.
//!
//! Every eligible media file from the archive is uploaded to object storage
//! under a content-type-specific folder, producing the filename to storage
//! key map the row materializer resolves against. Uploads are independent,
//! so they run with bounded parallelism; everything downstream of this stage
//! stays strictly sequential.

use std::collections::HashMap;
use std::sync::Arc;

use futures_util::stream::{self, StreamExt};
use tracing::{info, warn};
use uuid::Uuid;

use crate::storage::ObjectStore;

use super::archive_service::MediaFile;

const UPLOAD_CONCURRENCY: usize = 4;

pub struct MediaService {
    store: Arc<dyn ObjectStore>,
}

impl MediaService {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    /// Upload all media files, returning original filename to storage key.
    ///
    /// A failed upload leaves its filename out of the map; rows referencing
    /// it report the missing file like any other unresolved filename.
    pub async fn upload_all(&self, media: HashMap<String, MediaFile>) -> HashMap<String, String> {
        let total = media.len();
        let uploads = stream::iter(media)
            .map(|(name, file)| {
                let store = self.store.clone();
                async move {
                    let key = format!(
                        "{}/{}.{}",
                        file.kind.folder(),
                        Uuid::new_v4(),
                        file.extension
                    );
                    let content_type = file.kind.content_type(&file.extension);
                    match store.upload(&key, file.bytes, &content_type).await {
                        Ok(stored_key) => Some((name, stored_key)),
                        Err(err) => {
                            warn!("Failed to upload media file '{}': {}", name, err);
                            None
                        }
                    }
                }
            })
            .buffer_unordered(UPLOAD_CONCURRENCY)
            .collect::<Vec<_>>()
            .await;

        let resolved: HashMap<String, String> = uploads.into_iter().flatten().collect();
        info!("Uploaded {} of {} media files", resolved.len(), total);
        resolved
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::archive_service::MediaKind;
    use crate::storage::MemoryObjectStore;

    fn media_file(kind: MediaKind, extension: &str) -> MediaFile {
        MediaFile {
            bytes: vec![1, 2, 3],
            kind,
            extension: extension.to_string(),
        }
    }

    #[tokio::test]
    async fn test_uploads_under_kind_folder() {
        let store = Arc::new(MemoryObjectStore::new());
        let service = MediaService::new(store.clone());

        let mut media = HashMap::new();
        media.insert("clip.mp3".to_string(), media_file(MediaKind::Audio, "mp3"));
        media.insert("photo.png".to_string(), media_file(MediaKind::Image, "png"));

        let keys = service.upload_all(media).await;
        assert_eq!(keys.len(), 2);
        assert!(keys["clip.mp3"].starts_with("audio/"));
        assert!(keys["clip.mp3"].ends_with(".mp3"));
        assert!(keys["photo.png"].starts_with("images/"));
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn test_empty_media_set() {
        let service = MediaService::new(Arc::new(MemoryObjectStore::new()));
        let keys = service.upload_all(HashMap::new()).await;
        assert!(keys.is_empty());
    }
}
