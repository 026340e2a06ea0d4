//! Provenance metadata read from a file's embedded tags.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Placeholder some tag readers emit for an absent field.
pub const UNKNOWN_TAG: &str = "Unknown";

/// Camera, software and capture-date tags plus the tamper heuristic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Metadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub camera: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub software: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub capture_date: Option<String>,

    /// Editing-software provenance is present
    pub tamper_warning: bool,

    /// Extraction failure message, set instead of the tag fields
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Metadata {
    /// Build metadata from tag values and derive the tamper flag.
    pub fn from_tags(
        camera: Option<String>,
        software: Option<String>,
        capture_date: Option<String>,
    ) -> Self {
        let camera = normalize_tag(camera);
        let software = normalize_tag(software);
        let capture_date = normalize_tag(capture_date);
        let tamper_warning = software.is_some();

        Self {
            camera,
            software,
            capture_date,
            tamper_warning,
            error: None,
        }
    }

    /// Metadata for a file whose tags could not be read.
    pub fn from_error(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Trim a tag and drop it when blank or the "Unknown" placeholder.
fn normalize_tag(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().trim_matches('\0').trim().to_string())
        .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case(UNKNOWN_TAG))
}
