//! Autosave and manual snapshots on top of a [`KeyValueStore`].

use super::{KeyValueStore, StorageError, StorageResult};
use crate::config::{AUTOSAVE_KEY, BACKUP_KEY};
use crate::document::Document;

/// Asks the user to confirm a destructive action.
pub trait Confirm {
    fn confirm(&mut self, message: &str) -> bool;
}

impl<F: FnMut(&str) -> bool> Confirm for F {
    fn confirm(&mut self, message: &str) -> bool {
        self(message)
    }
}

/// Result of loading the manual snapshot.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    /// The user confirmed; this document replaces the current one.
    Loaded(Document),
    /// Nothing usable is stored under the snapshot key.
    NoSnapshot,
    /// The user declined.
    Declined,
}

/// Message shown before replacing the document with the snapshot.
pub const LOAD_SNAPSHOT_PROMPT: &str = "Load saved snapshot?";

/// Message shown before clearing the document.
pub const CLEAR_PROMPT: &str = "Clear all shapes?";

/// Writes the document to storage.
///
/// Read failures never propagate: absent or corrupt data is treated as no
/// data and logged.
pub struct PersistenceAdapter<S: KeyValueStore> {
    storage: S,
    autosave_key: String,
    backup_key: String,
    /// Payload of the last successful autosave.
    last_autosave: Option<String>,
}

impl<S: KeyValueStore> PersistenceAdapter<S> {
    /// Create an adapter using the default keys.
    pub fn new(storage: S) -> Self {
        Self::with_keys(storage, AUTOSAVE_KEY, BACKUP_KEY)
    }

    pub fn with_keys(
        storage: S,
        autosave_key: impl Into<String>,
        backup_key: impl Into<String>,
    ) -> Self {
        Self {
            storage,
            autosave_key: autosave_key.into(),
            backup_key: backup_key.into(),
            last_autosave: None,
        }
    }

    /// Get a reference to the storage backend.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Read the autosaved document. Absent or corrupt data yields an empty
    /// document.
    pub fn restore(&mut self) -> Document {
        match self.read(&self.autosave_key) {
            Some((json, document)) => {
                log::info!("Restored {} shapes from autosave", document.len());
                self.last_autosave = Some(json);
                document
            }
            None => Document::new(),
        }
    }

    /// Write the document under the autosave key.
    ///
    /// Returns `true` if a write happened. A payload identical to the last
    /// one written is skipped. Write failures are logged.
    pub fn autosave(&mut self, document: &Document) -> bool {
        let json = match document.to_json() {
            Ok(json) => json,
            Err(e) => {
                log::error!("Failed to serialize document for autosave: {}", e);
                return false;
            }
        };
        if self.last_autosave.as_deref() == Some(json.as_str()) {
            return false;
        }
        match self.storage.set(&self.autosave_key, &json) {
            Ok(()) => {
                log::debug!("Autosaved {} shapes", document.len());
                self.last_autosave = Some(json);
                true
            }
            Err(e) => {
                log::error!("Autosave failed: {}", e);
                false
            }
        }
    }

    /// Write the document under the snapshot key.
    pub fn save_snapshot(&self, document: &Document) -> StorageResult<()> {
        let json = document
            .to_json()
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        self.storage.set(&self.backup_key, &json)?;
        log::info!("Saved snapshot with {} shapes", document.len());
        Ok(())
    }

    /// Read the snapshot and ask for confirmation before handing it back.
    pub fn load_snapshot(&self, confirm: &mut dyn Confirm) -> LoadOutcome {
        let Some((_, document)) = self.read(&self.backup_key) else {
            return LoadOutcome::NoSnapshot;
        };
        if !confirm.confirm(LOAD_SNAPSHOT_PROMPT) {
            log::debug!("Snapshot load declined");
            return LoadOutcome::Declined;
        }
        LoadOutcome::Loaded(document)
    }

    /// Ask whether the document may be cleared.
    pub fn confirm_clear(&self, confirm: &mut dyn Confirm) -> bool {
        confirm.confirm(CLEAR_PROMPT)
    }

    fn read(&self, key: &str) -> Option<(String, Document)> {
        let json = match self.storage.get(key) {
            Ok(json) => json,
            Err(StorageError::NotFound(_)) => {
                log::debug!("Nothing stored under {}", key);
                return None;
            }
            Err(e) => {
                log::warn!("Failed to read {}: {}", key, e);
                return None;
            }
        };
        match Document::from_json(&json) {
            Ok(document) => Some((json, document)),
            Err(e) => {
                log::warn!("Ignoring corrupt data under {}: {}", key, e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::{Shape, ShapeKind};
    use crate::storage::MemoryStorage;
    use std::sync::Arc;

    fn doc(n: usize) -> Document {
        (0..n).fold(Document::new(), |doc, i| {
            doc.add(Shape::new(ShapeKind::Rect, i as f64, 0.0).with_id(format!("s{i}")))
        })
    }

    #[test]
    fn test_restore_absent_is_empty() {
        let mut adapter = PersistenceAdapter::new(MemoryStorage::new());
        assert!(adapter.restore().is_empty());
    }

    #[test]
    fn test_restore_corrupt_is_empty() {
        let storage = MemoryStorage::new();
        storage.set(AUTOSAVE_KEY, "{not json").unwrap();
        let mut adapter = PersistenceAdapter::new(storage);
        assert!(adapter.restore().is_empty());
    }

    #[test]
    fn test_autosave_round_trip_and_dedup() {
        let storage = Arc::new(MemoryStorage::new());
        let mut adapter = PersistenceAdapter::new(storage.clone());
        let document = doc(2);

        assert!(adapter.autosave(&document));
        assert!(!adapter.autosave(&document));
        assert!(adapter.autosave(&doc(3)));

        let mut fresh = PersistenceAdapter::new(storage);
        assert_eq!(fresh.restore(), doc(3));
        // Restoring primes the dedup state.
        assert!(!fresh.autosave(&doc(3)));
    }

    #[test]
    fn test_snapshot_requires_confirmation() {
        let adapter = PersistenceAdapter::new(MemoryStorage::new());
        let mut yes = |_: &str| true;
        let mut no = |_: &str| false;

        assert_eq!(adapter.load_snapshot(&mut yes), LoadOutcome::NoSnapshot);

        adapter.save_snapshot(&doc(3)).unwrap();
        assert_eq!(adapter.load_snapshot(&mut no), LoadOutcome::Declined);
        assert_eq!(adapter.load_snapshot(&mut yes), LoadOutcome::Loaded(doc(3)));
    }

    #[test]
    fn test_prompt_text() {
        let adapter = PersistenceAdapter::new(MemoryStorage::new());
        let mut seen = Vec::new();
        let mut record = |message: &str| {
            seen.push(message.to_string());
            false
        };
        assert!(!adapter.confirm_clear(&mut record));
        assert_eq!(seen, vec![CLEAR_PROMPT.to_string()]);
    }
}
