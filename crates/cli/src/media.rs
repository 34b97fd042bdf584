// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Media parts and payload loading.
//!
//! A part carries its payload either inline (base64) or as a storage
//! reference resolved against the recording's directory.

use async_trait::async_trait;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::ReplayError;

pub const CONTENT_TYPE_TEXT: &str = "text";
pub const CONTENT_TYPE_AUDIO: &str = "audio";
pub const CONTENT_TYPE_IMAGE: &str = "image";
pub const CONTENT_TYPE_VIDEO: &str = "video";

/// One part of a multimodal message
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct ContentPart {
    #[serde(rename = "type")]
    pub part_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media: Option<MediaRef>,
}

impl ContentPart {
    /// Whether this part should be emitted as a media chunk
    pub fn is_media(&self) -> bool {
        self.media.is_some()
            && matches!(
                self.part_type.as_str(),
                CONTENT_TYPE_AUDIO | CONTENT_TYPE_IMAGE | CONTENT_TYPE_VIDEO
            )
    }
}

/// Where a media payload lives
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct MediaRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_reference: Option<String>,
    #[serde(default)]
    pub mime_type: String,
    /// Inline payload, base64 (standard alphabet)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

/// File-read primitive used for external media references
#[async_trait]
pub trait MediaReader: Send + Sync {
    async fn read(&self, path: &Path) -> std::io::Result<Vec<u8>>;
}

/// Reads media from the local filesystem on tokio's blocking pool
#[derive(Clone, Copy, Debug, Default)]
pub struct FsMediaReader;

#[async_trait]
impl MediaReader for FsMediaReader {
    async fn read(&self, path: &Path) -> std::io::Result<Vec<u8>> {
        tokio::fs::read(path).await
    }
}

/// Resolve a storage reference against the base directory.
///
/// Absolute references are used as-is.
pub fn resolve_reference(reference: &str, base_dir: Option<&Path>) -> PathBuf {
    let path = Path::new(reference);
    match base_dir {
        Some(base) if path.is_relative() => base.join(path),
        _ => path.to_path_buf(),
    }
}

/// Load a media payload, preferring inline data over a storage reference.
pub async fn load_media(
    media: &MediaRef,
    base_dir: Option<&Path>,
    reader: &dyn MediaReader,
) -> Result<Vec<u8>, ReplayError> {
    if let Some(data) = media.data.as_deref().filter(|d| !d.is_empty()) {
        return base64::engine::general_purpose::STANDARD
            .decode(data)
            .map_err(|e| ReplayError::Media {
                origin: "inline data".to_string(),
                message: e.to_string(),
            });
    }

    if let Some(reference) = media.storage_reference.as_deref().filter(|r| !r.is_empty()) {
        let path = resolve_reference(reference, base_dir);
        return reader.read(&path).await.map_err(|e| ReplayError::Media {
            origin: path.display().to_string(),
            message: e.to_string(),
        });
    }

    Err(ReplayError::Media {
        origin: "part".to_string(),
        message: "no media data source".to_string(),
    })
}

#[cfg(test)]
#[path = "media_tests.rs"]
mod tests;
