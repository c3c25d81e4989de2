//! Render/export adapter.
//!
//! Projects the store into a view model the panel page turns into elements,
//! and implements the per-item download and drag actions. Cards carry their
//! render-time index, so the panel re-renders after every mutation to keep
//! indices in step with the store.

use chrono::{DateTime, Utc};

use crate::constants::{DEFAULT_DOWNLOAD_FORMAT, DOWNLOAD_PREFIX};
use crate::host::ExportHost;
use crate::model::{ExtractedImage, ImageKey, SelectionMode};

/// Text shown when nothing has been extracted yet.
pub const EMPTY_PLACEHOLDER: &str = "Extracted images will appear here";

/// Text used for missing optional image fields.
const UNKNOWN: &str = "Unknown";

/// Display model of the image list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Gallery {
    /// Nothing extracted; show [`EMPTY_PLACEHOLDER`]
    Empty,
    /// One card per image, oldest first
    Items(Vec<ImageCard>),
}

impl Gallery {
    /// Build the gallery for the current collection.
    pub fn project(images: &[ExtractedImage]) -> Self {
        if images.is_empty() {
            return Gallery::Empty;
        }

        Gallery::Items(
            images
                .iter()
                .enumerate()
                .map(|(index, image)| ImageCard::new(index, image))
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        match self {
            Gallery::Empty => 0,
            Gallery::Items(cards) => cards.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One rendered image with its actions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageCard {
    /// Position in the collection at render time
    pub index: usize,
    pub key: ImageKey,
    pub src: String,
    /// Size line, e.g. "Size: 640x480"
    pub size: String,
    /// Capture time line
    pub captured: String,
    /// Source page line
    pub source: String,
}

impl ImageCard {
    fn new(index: usize, image: &ExtractedImage) -> Self {
        Self {
            index,
            key: image.key(),
            src: image.src.clone(),
            size: format!("Size: {}", image.dimensions.as_deref().unwrap_or(UNKNOWN)),
            captured: format!("Extracted: {}", format_capture_time(image.timestamp)),
            source: format!("Source: {}", image.url.as_deref().unwrap_or(UNKNOWN)),
        }
    }
}

/// Format an epoch-millisecond capture time for display.
pub fn format_capture_time(timestamp_ms: i64) -> String {
    match DateTime::from_timestamp_millis(timestamp_ms) {
        Some(time) => time.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        None => UNKNOWN.to_string(),
    }
}

/// Current wall-clock time.
pub fn now_utc() -> DateTime<Utc> {
    web_time::SystemTime::now()
        .duration_since(web_time::SystemTime::UNIX_EPOCH)
        .map(since_epoch)
        .unwrap_or_default()
}

/// Time `elapsed` after the Unix epoch, or the epoch itself when out of range.
fn since_epoch(elapsed: std::time::Duration) -> DateTime<Utc> {
    i64::try_from(elapsed.as_millis())
        .ok()
        .and_then(DateTime::from_timestamp_millis)
        .unwrap_or_default()
}

/// File name for a download started at `now`.
///
/// `peacnut-image-2024-05-01T12-30-45-123Z.png`: an ISO-8601 timestamp with
/// `:` and `.` replaced so it is valid on every file system.
pub fn download_filename(image: &ExtractedImage, now: DateTime<Utc>) -> String {
    let extension = image
        .format
        .as_deref()
        .filter(|format| !format.is_empty())
        .unwrap_or(DEFAULT_DOWNLOAD_FORMAT);
    format!(
        "{}-{}.{}",
        DOWNLOAD_PREFIX,
        now.format("%Y-%m-%dT%H-%M-%S-%3fZ"),
        extension
    )
}

/// How a download request ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// File offered to the user under this name
    Saved(String),
    /// Fetch failed; the image was opened in a new tab instead
    OpenedFallback,
}

/// Download `image`, falling back to opening it when the bytes can't be fetched.
pub async fn download<H: ExportHost>(
    host: &H,
    image: &ExtractedImage,
    now: DateTime<Utc>,
) -> DownloadOutcome {
    let file_name = download_filename(image, now);
    log::info!("⬇️ Downloading {} as {}", image.src, file_name);

    let saved = match host.fetch(&image.src).await {
        Ok(resource) => host.save_file(&file_name, &resource),
        Err(e) => Err(e),
    };

    match saved {
        Ok(()) => DownloadOutcome::Saved(file_name),
        Err(e) => {
            log::warn!("Download failed, opening image instead: {}", e);
            host.open_in_new_tab(&image.src);
            DownloadOutcome::OpenedFallback
        }
    }
}

/// Drop effect allowed for exported images.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropEffect {
    Copy,
}

impl DropEffect {
    /// Value for `DataTransfer.effectAllowed`.
    pub fn as_str(&self) -> &'static str {
        match self {
            DropEffect::Copy => "copy",
        }
    }
}

/// Data attached to a drag started on an image card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragPayload {
    /// `(mime type, data)` pairs in the order they are set
    pub entries: Vec<(&'static str, String)>,
    pub effect: DropEffect,
}

impl DragPayload {
    pub const URI_LIST: &'static str = "text/uri-list";
    pub const PLAIN_TEXT: &'static str = "text/plain";

    /// Expose the image source as a link and as text.
    pub fn for_image(image: &ExtractedImage) -> Self {
        Self::for_src(&image.src)
    }

    /// Payload for a rendered card, which only knows its source.
    pub fn for_src(src: &str) -> Self {
        Self {
            entries: vec![
                (Self::URI_LIST, src.to_string()),
                (Self::PLAIN_TEXT, src.to_string()),
            ],
            effect: DropEffect::Copy,
        }
    }
}

/// Button label and status line for the mirrored selection mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModeIndicator {
    pub active: bool,
    pub button_label: &'static str,
    pub status: &'static str,
}

impl ModeIndicator {
    /// `Unknown` is shown like `Inactive`.
    pub fn for_mode(mode: SelectionMode) -> Self {
        if mode.is_active() {
            Self {
                active: true,
                button_label: "Stop Selection",
                status: "Selection mode ACTIVE - click an element",
            }
        } else {
            Self {
                active: false,
                button_label: "Selection Mode",
                status: "Click \"Selection Mode\" to start",
            }
        }
    }
}

/// Panel surface the adapter renders into.
pub trait PanelView {
    /// Replace the image list.
    fn render_gallery(&mut self, gallery: &Gallery);

    /// Update the selection button and status line.
    fn show_mode(&mut self, indicator: &ModeIndicator);

    /// Show a message the user has to acknowledge.
    fn notify(&mut self, message: &str);
}
