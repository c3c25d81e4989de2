//! Extracted image data model.
//!
//! An [`ExtractedImage`] is what the page agent reports when the user clicks
//! an element in selection mode. Field names follow the agent's JSON payload.

use serde::{Deserialize, Serialize};

use crate::constants::DEDUP_WINDOW_MS;

/// One captured image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedImage {
    /// Resolved image URL or data URI
    pub src: String,
    /// Capture time in epoch milliseconds
    pub timestamp: i64,
    /// Human-readable size, e.g. "640x480"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<String>,
    /// Page the image was extracted from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// File extension used for downloads
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

impl ExtractedImage {
    /// Create an image with only the required fields set.
    pub fn new(src: impl Into<String>, timestamp: i64) -> Self {
        Self {
            src: src.into(),
            timestamp,
            dimensions: None,
            url: None,
            format: None,
        }
    }

    /// Set the dimensions string.
    pub fn with_dimensions(mut self, dimensions: impl Into<String>) -> Self {
        self.dimensions = Some(dimensions.into());
        self
    }

    /// Set the source page URL.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Set the download format.
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    /// Identity of this image inside a collection.
    pub fn key(&self) -> ImageKey {
        ImageKey {
            src: self.src.clone(),
            timestamp: self.timestamp,
        }
    }

    /// Whether `other` is a re-report of the same extraction.
    ///
    /// Same source and capture times less than [`DEDUP_WINDOW_MS`] apart.
    pub fn is_duplicate_of(&self, other: &ExtractedImage) -> bool {
        self.src == other.src && (self.timestamp - other.timestamp).abs() < DEDUP_WINDOW_MS
    }
}

/// Stable identifier of a stored image.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageKey {
    pub src: String,
    pub timestamp: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_window() {
        let a = ExtractedImage::new("https://example.com/a.png", 10_000);
        assert!(a.is_duplicate_of(&ExtractedImage::new("https://example.com/a.png", 10_999)));
        assert!(a.is_duplicate_of(&ExtractedImage::new("https://example.com/a.png", 9_001)));
        assert!(!a.is_duplicate_of(&ExtractedImage::new("https://example.com/a.png", 11_000)));
        assert!(!a.is_duplicate_of(&ExtractedImage::new("https://example.com/b.png", 10_000)));
    }

    #[test]
    fn test_agent_payload_parsing() {
        let json = r#"{"src":"data:image/png;base64,AAAA","timestamp":1714566645123,"dimensions":"32x32"}"#;
        let image: ExtractedImage = serde_json::from_str(json).unwrap();

        assert_eq!(image.timestamp, 1_714_566_645_123);
        assert_eq!(image.dimensions.as_deref(), Some("32x32"));
        assert!(image.url.is_none());
        assert!(image.format.is_none());
    }

    #[test]
    fn test_optional_fields_omitted() {
        let json = serde_json::to_string(&ExtractedImage::new("a.png", 1)).unwrap();
        assert_eq!(json, r#"{"src":"a.png","timestamp":1}"#);
    }
}
