use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use url::Url;

use crate::error::ValidationError;

/// What kind of playable location a source handed back. Inferred from the
/// locator's form; a locator matching neither form is invalid.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ArtifactKind {
    /// A streaming manifest (HLS/DASH) meant for a player, not a download.
    Manifest,
    /// A direct file: video container, page image or archive.
    Direct,
}

const MANIFEST_EXTENSIONS: &[&str] = &["m3u8", "mpd"];
const DIRECT_EXTENSIONS: &[&str] = &[
    "mp4", "mkv", "webm", "avi", "mov", "ts", // video containers
    "jpg", "jpeg", "png", "webp", "gif", // reading-content pages
    "cbz", "cbr", "pdf", "epub", // reading-content archives
];

impl ArtifactKind {
    /// Infers the kind from a locator. The extension is taken from the URL
    /// path so query strings and fragments don't confuse it.
    pub fn infer(locator: &str) -> Result<Self, ValidationError> {
        let url = Url::parse(locator).map_err(|_| ValidationError::InvalidLocator {
            locator: locator.to_string(),
        })?;
        let path = url.path().to_ascii_lowercase();
        let ext = path.rsplit_once('.').map(|(_, ext)| ext).unwrap_or("");

        if MANIFEST_EXTENSIONS.contains(&ext) {
            Ok(ArtifactKind::Manifest)
        } else if DIRECT_EXTENSIONS.contains(&ext) {
            Ok(ArtifactKind::Direct)
        } else {
            Err(ValidationError::UnrecognizedArtifact {
                locator: locator.to_string(),
            })
        }
    }
}

/// A resolved playable location, the winner of a media race.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MediaArtifact {
    pub locator: String,
    pub kind: ArtifactKind,
    /// Transport headers (Referer etc.) the fetch needs, if any.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub headers: HashMap<String, String>,
}

impl MediaArtifact {
    /// Builds an artifact, inferring and checking the kind in one step.
    pub fn from_locator(locator: impl Into<String>) -> Result<Self, ValidationError> {
        let locator = locator.into();
        let kind = ArtifactKind::infer(&locator)?;
        Ok(Self {
            locator,
            kind,
            headers: HashMap::new(),
        })
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infer_manifest() {
        let kind = ArtifactKind::infer("https://cdn.example.com/hls/master.m3u8?token=abc").unwrap();
        assert_eq!(kind, ArtifactKind::Manifest);
    }

    #[test]
    fn test_infer_direct_file() {
        let kind = ArtifactKind::infer("https://files.example.com/ep1.mp4").unwrap();
        assert_eq!(kind, ArtifactKind::Direct);
        let kind = ArtifactKind::infer("https://pages.example.com/ch1/001.png").unwrap();
        assert_eq!(kind, ArtifactKind::Direct);
    }

    #[test]
    fn test_infer_rejects_unknown_form() {
        let err = ArtifactKind::infer("https://example.com/watch?id=123").unwrap_err();
        assert!(matches!(err, ValidationError::UnrecognizedArtifact { .. }));
    }

    #[test]
    fn test_infer_rejects_non_url() {
        let err = ArtifactKind::infer("not a url").unwrap_err();
        assert!(matches!(err, ValidationError::InvalidLocator { .. }));
    }

    #[test]
    fn test_artifact_headers() {
        let artifact = MediaArtifact::from_locator("https://cdn.example.com/master.m3u8")
            .unwrap()
            .with_header("Referer", "https://example.com/");
        assert_eq!(artifact.headers.get("Referer").map(String::as_str), Some("https://example.com/"));
    }
}
