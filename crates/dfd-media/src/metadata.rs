//! Provenance tag extraction.
//!
//! Reads camera, editing-software and capture-date tags from a file's
//! embedded metadata: the EXIF block for still images, container tags (via
//! ffprobe) for videos. Failures never propagate; they are folded into
//! [`Metadata::error`].

use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use exif::{In, Tag, Value};
use tracing::{debug, warn};

use dfd_models::{MediaKind, Metadata};

use crate::error::{MediaError, MediaResult};
use crate::metrics;
use crate::probe::probe_video;

/// Image containers that can carry an EXIF block.
const EXIF_CONTAINERS: &[&str] = &["jpg", "jpeg", "png", "webp", "tif", "tiff", "heic", "heif", "avif"];

const CAMERA_KEYS: &[&str] = &["com.apple.quicktime.model", "model", "com.android.model"];
const SOFTWARE_KEYS: &[&str] = &["software", "com.apple.quicktime.software"];
const DATE_KEYS: &[&str] = &["com.apple.quicktime.creationdate", "creation_time", "date"];

/// Extract metadata, choosing the tag reader by media kind.
pub fn extract_for(path: impl AsRef<Path>, kind: MediaKind) -> Metadata {
    match kind {
        MediaKind::Image => extract(path),
        MediaKind::Video => extract_container(path),
    }
}

/// Extract EXIF provenance tags from a still image.
pub fn extract(path: impl AsRef<Path>) -> Metadata {
    let path = path.as_ref();
    recover(path, read_exif(path))
}

/// Extract provenance tags from a video container's format tags.
pub fn extract_container(path: impl AsRef<Path>) -> Metadata {
    let path = path.as_ref();
    let result = probe_video(path)
        .map(|info| metadata_from_container_tags(&info.tags))
        .map_err(|e| MediaError::metadata(e.to_string()));
    recover(path, result)
}

/// Fold a failure into the error marker.
fn recover(path: &Path, result: MediaResult<Metadata>) -> Metadata {
    match result {
        Ok(metadata) => {
            debug!(
                path = %path.display(),
                tamper_warning = metadata.tamper_warning,
                "Metadata extracted"
            );
            metadata
        }
        Err(e) => {
            warn!(path = %path.display(), "Metadata extraction failed: {}", e);
            metrics::record_metadata_error();
            let message = match e {
                MediaError::Metadata(message) => message,
                other => other.to_string(),
            };
            Metadata::from_error(message)
        }
    }
}

fn read_exif(path: &Path) -> MediaResult<Metadata> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    if !EXIF_CONTAINERS.contains(&ext.as_str()) {
        // Format has no EXIF block to read
        return Ok(Metadata::from_tags(None, None, None));
    }

    let file = File::open(path).map_err(|e| MediaError::metadata(e.to_string()))?;
    let mut reader = BufReader::new(file);

    let exif = match exif::Reader::new().read_from_container(&mut reader) {
        Ok(exif) => exif,
        Err(exif::Error::NotFound(_)) => return Ok(Metadata::from_tags(None, None, None)),
        Err(e) => return Err(MediaError::metadata(e.to_string())),
    };

    let ascii = |tag: Tag| -> Option<String> {
        exif.get_field(tag, In::PRIMARY)
            .and_then(|field| ascii_value(&field.value))
    };

    Ok(Metadata::from_tags(
        ascii(Tag::Model),
        ascii(Tag::Software),
        ascii(Tag::DateTimeOriginal).or_else(|| ascii(Tag::DateTime)),
    ))
}

/// First ASCII component of an EXIF value.
fn ascii_value(value: &Value) -> Option<String> {
    match value {
        Value::Ascii(parts) => parts
            .first()
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned()),
        _ => None,
    }
}

/// Map container tags (lower-cased keys) onto the metadata fields.
pub fn metadata_from_container_tags(tags: &BTreeMap<String, String>) -> Metadata {
    let first = |keys: &[&str]| -> Option<String> {
        keys.iter()
            .filter_map(|key| tags.get(*key))
            .find(|value| !value.trim().is_empty())
            .cloned()
    };

    Metadata::from_tags(first(CAMERA_KEYS), first(SOFTWARE_KEYS), first(DATE_KEYS))
}
