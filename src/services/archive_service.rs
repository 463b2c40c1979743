//! Archive extraction for bulk uploads.
//!
//! A bulk upload is a single ZIP holding exactly one CSV data file plus any
//! number of media files under a top-level `media/` directory. Anything else
//! in the archive is ignored.

use std::collections::HashMap;
use std::io::{Cursor, Read};

use tracing::{debug, warn};
use zip::ZipArchive;

use crate::errors::ImportError;

/// Top-level archive directory media files must live under.
pub const MEDIA_DIR: &str = "media/";

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp"];
const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "m4a", "ogg"];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Audio,
}

impl MediaKind {
    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.to_lowercase();
        if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            Some(MediaKind::Image)
        } else if AUDIO_EXTENSIONS.contains(&ext.as_str()) {
            Some(MediaKind::Audio)
        } else {
            None
        }
    }

    /// Storage folder for this kind of media.
    pub fn folder(&self) -> &'static str {
        match self {
            MediaKind::Image => "images",
            MediaKind::Audio => "audio",
        }
    }

    pub fn content_type(&self, ext: &str) -> String {
        match self {
            MediaKind::Image => format!("image/{}", if ext == "jpg" { "jpeg" } else { ext }),
            MediaKind::Audio => format!("audio/{}", if ext == "mp3" { "mpeg" } else { ext }),
        }
    }
}

#[derive(Debug)]
pub struct MediaFile {
    pub bytes: Vec<u8>,
    pub kind: MediaKind,
    pub extension: String,
}

#[derive(Debug)]
pub struct ExtractedArchive {
    /// Decoded text of the single CSV file.
    pub table_text: String,
    /// Media files keyed by their path relative to `media/`.
    pub media: HashMap<String, MediaFile>,
}

/// Open the uploaded archive and isolate its CSV file and media files.
///
/// Fails terminally when the archive holds zero or more than one CSV; the
/// pipeline never guesses which file to import.
pub fn extract_archive(bytes: &[u8]) -> Result<ExtractedArchive, ImportError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| ImportError::Archive(e.to_string()))?;

    let mut csv_indices = Vec::new();
    let mut media_indices = Vec::new();

    for i in 0..archive.len() {
        let entry = archive
            .by_index(i)
            .map_err(|e| ImportError::Archive(e.to_string()))?;
        if entry.is_dir() {
            continue;
        }
        let name = entry.name().to_string();
        if file_extension(&name).is_some_and(|ext| ext.eq_ignore_ascii_case("csv")) {
            csv_indices.push(i);
        } else if name.starts_with(MEDIA_DIR) {
            media_indices.push((i, name));
        }
    }

    match csv_indices.len() {
        0 => return Err(ImportError::NoTabularFile),
        1 => {}
        n => return Err(ImportError::AmbiguousTabularFile(n)),
    }

    let table_text = {
        let mut entry = archive
            .by_index(csv_indices[0])
            .map_err(|e| ImportError::Archive(e.to_string()))?;
        let mut raw = Vec::new();
        entry
            .read_to_end(&mut raw)
            .map_err(|e| ImportError::Archive(e.to_string()))?;
        String::from_utf8(raw)
            .map_err(|_| ImportError::Archive("CSV file is not valid UTF-8".to_string()))?
    };

    let mut media = HashMap::new();
    for (i, name) in media_indices {
        let extension = match file_extension(&name) {
            Some(ext) => ext.to_lowercase(),
            None => continue,
        };
        let kind = match MediaKind::from_extension(&extension) {
            Some(kind) => kind,
            None => {
                warn!("Skipping media file with unsupported extension: {}", name);
                continue;
            }
        };

        let mut entry = archive
            .by_index(i)
            .map_err(|e| ImportError::Archive(e.to_string()))?;
        let mut bytes = Vec::new();
        entry
            .read_to_end(&mut bytes)
            .map_err(|e| ImportError::Archive(e.to_string()))?;

        let relative = name[MEDIA_DIR.len()..].to_string();
        media.insert(
            relative,
            MediaFile {
                bytes,
                kind,
                extension,
            },
        );
    }

    debug!(
        "Extracted archive: {} bytes of CSV, {} media files",
        table_text.len(),
        media.len()
    );

    Ok(ExtractedArchive { table_text, media })
}

fn file_extension(name: &str) -> Option<&str> {
    let base = name.rsplit('/').next().unwrap_or(name);
    let (stem, ext) = base.rsplit_once('.')?;
    if stem.is_empty() {
        None
    } else {
        Some(ext)
    }
}
