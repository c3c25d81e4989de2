//! Image collection store.
//!
//! Holds the extracted images in insertion order (most recent last) and
//! rewrites the persisted record after every mutation. Only the newest
//! [`HISTORY_LIMIT`] entries are kept: an append past the limit evicts the
//! oldest image once the record is written.

mod storage;

#[cfg(target_arch = "wasm32")]
mod chrome_storage;

pub use storage::{KeyValueStore, MemoryStorage};

#[cfg(not(target_arch = "wasm32"))]
pub use storage::FileStorage;

#[cfg(target_arch = "wasm32")]
pub use chrome_storage::ChromeStorage;

use crate::constants::HISTORY_LIMIT;
use crate::error::StoreError;
use crate::model::{ExtractedImage, ImageKey};

/// Result of [`ImageStore::add`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    /// Appended to the collection
    Added,
    /// Same source already captured within the dedup window
    Duplicate,
}

/// Ordered collection of extracted images backed by a key-value store.
#[derive(Debug)]
pub struct ImageStore<S> {
    images: Vec<ExtractedImage>,
    storage: S,
    key: String,
}

impl<S: KeyValueStore> ImageStore<S> {
    /// Create an empty store persisting under `key`. Call [`load`](Self::load)
    /// to pick up a previous session.
    pub fn new(storage: S, key: impl Into<String>) -> Self {
        Self {
            images: Vec::new(),
            storage,
            key: key.into(),
        }
    }

    /// Read the persisted record into memory.
    ///
    /// A missing record gives an empty collection. A corrupt one is logged
    /// and also treated as empty.
    pub fn load(&mut self) {
        self.images = match self.read_record() {
            Ok(Some(mut images)) => {
                log::info!("🖼️ Loaded {} saved images", images.len());
                truncate_history(&mut images);
                images
            }
            Ok(None) => {
                log::debug!("No saved images under '{}'", self.key);
                Vec::new()
            }
            Err(e) => {
                log::warn!("Failed to load saved images: {}", e);
                Vec::new()
            }
        };
    }

    fn read_record(&self) -> Result<Option<Vec<ExtractedImage>>, StoreError> {
        let Some(json) = self.storage.get(&self.key)? else {
            return Ok(None);
        };
        Ok(Some(serde_json::from_str(&json)?))
    }

    /// Append `image` unless it duplicates an existing capture.
    pub fn add(&mut self, image: ExtractedImage) -> AddOutcome {
        if self.images.iter().any(|existing| existing.is_duplicate_of(&image)) {
            log::debug!("Image already extracted, ignored: {}", image.src);
            return AddOutcome::Duplicate;
        }

        log::debug!("➕ Image added: {}", image.src);
        self.images.push(image);
        self.flush();
        truncate_history(&mut self.images);
        AddOutcome::Added
    }

    /// Remove the image at `index`.
    ///
    /// Indices come from the last render; anything out of range is ignored
    /// and reported as `false`.
    pub fn remove(&mut self, index: isize) -> bool {
        let Some(index) = usize::try_from(index)
            .ok()
            .filter(|&i| i < self.images.len())
        else {
            log::debug!("Ignoring delete of stale index {}", index);
            return false;
        };

        let removed = self.images.remove(index);
        self.flush();
        log::debug!(
            "🗑️ Image removed: {} ({} left)",
            removed.src,
            self.images.len()
        );
        true
    }

    /// Remove every image.
    pub fn clear(&mut self) {
        self.images.clear();
        self.flush();
        log::debug!("🗑️ Images cleared");
    }

    /// Write the newest [`HISTORY_LIMIT`] images to storage.
    pub fn persist(&mut self) -> Result<(), StoreError> {
        let start = self.images.len().saturating_sub(HISTORY_LIMIT);
        let json = serde_json::to_string(&self.images[start..])?;
        self.storage.set(&self.key, &json)
    }

    /// Persist after a mutation. Failures keep the in-memory state; the next
    /// successful write catches up.
    fn flush(&mut self) {
        if let Err(e) = self.persist() {
            log::warn!("Failed to save images: {}", e);
        }
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ExtractedImage> {
        self.images.get(index)
    }

    /// All images, oldest first.
    pub fn images(&self) -> &[ExtractedImage] {
        &self.images
    }

    /// Current position of the image identified by `key`.
    pub fn position_of(&self, key: &ImageKey) -> Option<usize> {
        self.images
            .iter()
            .position(|image| image.src == key.src && image.timestamp == key.timestamp)
    }

    /// Backing storage.
    pub fn storage(&self) -> &S {
        &self.storage
    }
}

/// Drop the oldest entries beyond [`HISTORY_LIMIT`].
fn truncate_history(images: &mut Vec<ExtractedImage>) {
    let excess = images.len().saturating_sub(HISTORY_LIMIT);
    if excess > 0 {
        images.drain(..excess);
        log::debug!("Evicted {} oldest images", excess);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::DEFAULT_STORAGE_KEY;

    fn store() -> ImageStore<MemoryStorage> {
        ImageStore::new(MemoryStorage::new(), DEFAULT_STORAGE_KEY)
    }

    fn image(n: i64) -> ExtractedImage {
        ExtractedImage::new(format!("https://example.com/{}.png", n), 1_000_000 + n * 5_000)
    }

    fn persisted(store: &ImageStore<MemoryStorage>) -> Vec<ExtractedImage> {
        let json = store.storage().get(DEFAULT_STORAGE_KEY).unwrap().unwrap();
        serde_json::from_str(&json).unwrap()
    }

    #[test]
    fn test_duplicate_within_window_is_ignored() {
        let mut store = store();
        let first = ExtractedImage::new("https://example.com/a.png", 50_000);

        assert_eq!(store.add(first.clone()), AddOutcome::Added);
        assert_eq!(store.len(), 1);

        let again = ExtractedImage::new("https://example.com/a.png", 50_400);
        assert_eq!(store.add(again), AddOutcome::Duplicate);
        assert_eq!(store.add(first), AddOutcome::Duplicate);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_same_source_outside_window_kept() {
        let mut store = store();
        store.add(ExtractedImage::new("https://example.com/a.png", 50_000));
        store.add(ExtractedImage::new("https://example.com/a.png", 51_000));
        store.add(ExtractedImage::new("https://example.com/a.png", 52_500));

        assert_eq!(store.len(), 3);
        let timestamps: Vec<_> = persisted(&store).iter().map(|i| i.timestamp).collect();
        assert_eq!(timestamps, vec![50_000, 51_000, 52_500]);
    }

    #[test]
    fn test_persist_keeps_newest_twenty_in_order() {
        let mut store = store();
        for n in 0..25 {
            store.add(image(n));
        }

        let expected: Vec<_> = (5..25).map(image).collect();
        assert_eq!(store.len(), HISTORY_LIMIT);
        assert_eq!(store.images(), expected.as_slice());
        assert_eq!(persisted(&store), expected);
    }

    #[test]
    fn test_eviction_keeps_delete_indices_in_step() {
        let mut store = store();
        for n in 0..21 {
            store.add(image(n));
        }

        // Index 0 now points at the second image ever added
        assert!(store.remove(0));
        assert_eq!(store.get(0), Some(&image(2)));
        assert_eq!(persisted(&store), store.images());
    }

    #[test]
    fn test_load_truncates_oversized_record() {
        let mut storage = MemoryStorage::new();
        let oversized: Vec<_> = (0..30).map(image).collect();
        storage
            .set(DEFAULT_STORAGE_KEY, &serde_json::to_string(&oversized).unwrap())
            .unwrap();

        let mut store = ImageStore::new(storage, DEFAULT_STORAGE_KEY);
        store.load();
        assert_eq!(store.len(), HISTORY_LIMIT);
        assert_eq!(store.get(0), Some(&image(10)));
    }

    #[test]
    fn test_remove_preserves_order() {
        let mut store = store();
        for n in 0..4 {
            store.add(image(n));
        }

        assert!(store.remove(1));
        assert_eq!(store.images(), &[image(0), image(2), image(3)]);
        assert_eq!(persisted(&store), vec![image(0), image(2), image(3)]);
    }

    #[test]
    fn test_remove_out_of_range_ignored() {
        let mut store = store();
        for n in 0..3 {
            store.add(image(n));
        }

        assert!(!store.remove(3));
        assert!(!store.remove(-1));
        assert!(!store.remove(isize::MAX));
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_clear_empties_record() {
        let mut store = store();
        store.add(image(0));
        store.add(image(1));

        store.clear();
        assert!(store.is_empty());
        assert!(persisted(&store).is_empty());
    }

    #[test]
    fn test_load_previous_session() {
        let mut first = store();
        first.add(image(0));
        first.add(image(1));
        let storage = first.storage().clone();

        let mut second = ImageStore::new(storage, DEFAULT_STORAGE_KEY);
        assert!(second.is_empty());
        second.load();
        assert_eq!(second.images(), &[image(0), image(1)]);
    }

    #[test]
    fn test_load_missing_or_corrupt_record() {
        let mut store = store();
        store.load();
        assert!(store.is_empty());

        let mut storage = MemoryStorage::new();
        storage.set(DEFAULT_STORAGE_KEY, "{not json").unwrap();
        let mut store = ImageStore::new(storage, DEFAULT_STORAGE_KEY);
        store.load();
        assert!(store.is_empty());
    }

    #[test]
    fn test_load_record_of_previous_extension_version() {
        let mut storage = MemoryStorage::new();
        storage
            .set(
                DEFAULT_STORAGE_KEY,
                r#"[{"src":"data:image/png;base64,iVBORw0KGgo=","timestamp":1714566645123,
                    "dimensions":"1x1","url":"https://example.com/","format":"png"},
                   {"src":"https://example.com/b.jpg","timestamp":1714566650000}]"#,
            )
            .unwrap();

        let mut store = ImageStore::new(storage, DEFAULT_STORAGE_KEY);
        store.load();
        assert_eq!(store.len(), 2);
        assert_eq!(store.get(0).and_then(|i| i.dimensions.as_deref()), Some("1x1"));
        assert_eq!(store.get(1).and_then(|i| i.format.as_deref()), None);
    }

    #[test]
    fn test_position_of_key() {
        let mut store = store();
        store.add(image(0));
        store.add(image(1));

        assert_eq!(store.position_of(&image(1).key()), Some(1));
        store.remove(0);
        assert_eq!(store.position_of(&image(1).key()), Some(0));
        assert_eq!(store.position_of(&image(0).key()), None);
    }
}
