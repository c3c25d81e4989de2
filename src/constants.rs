//! Global constants for the peacnut panel

use std::time::Duration;

/// Maximum number of images kept, in memory and in the persisted record
pub const HISTORY_LIMIT: usize = 20;

/// Two extractions of the same source closer than this are the same image
pub const DEDUP_WINDOW_MS: i64 = 1000;

/// Wait between agent injection and the retried toggle
pub const AGENT_SETTLE_DELAY: Duration = Duration::from_millis(200);

/// Default storage key for the persisted collection
pub const DEFAULT_STORAGE_KEY: &str = "extractedImages";

/// Default page agent script resource
pub const DEFAULT_AGENT_SCRIPT: &str = "content.js";

/// Default page agent stylesheet resource
pub const DEFAULT_AGENT_STYLESHEET: &str = "content.css";

/// Prefix of downloaded file names
pub const DOWNLOAD_PREFIX: &str = "peacnut-image";

/// Extension used when an image carries no format
pub const DEFAULT_DOWNLOAD_FORMAT: &str = "png";

/// URL prefixes of pages the host never lets us script.
pub const RESTRICTED_URL_PREFIXES: &[&str] = &[
    "chrome://",
    "chrome-extension://",
    "moz-extension://",
    "edge://",
    "about:",
    "view-source:",
];
