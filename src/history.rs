use std::sync::Arc;

use crate::models::HistoryItem;
use crate::storage::KeyValueStore;

/// Newest-first list of past generations, mirrored to a key-value store.
///
/// Only the first `cap` items are ever written back. The in-memory list may
/// run longer for the rest of the session.
pub struct HistoryStore {
    kv: Arc<dyn KeyValueStore>,
    key: String,
    cap: usize,
    items: Vec<HistoryItem>,
}

impl HistoryStore {
    pub fn open(kv: Arc<dyn KeyValueStore>, key: impl Into<String>, cap: usize) -> Self {
        let key = key.into();
        let items = load_items(kv.as_ref(), &key);
        log::debug!("Loaded {} history records from '{}'", items.len(), key);
        Self {
            kv,
            key,
            cap: cap.max(1),
            items,
        }
    }

    pub fn items(&self) -> &[HistoryItem] {
        &self.items
    }

    pub fn get(&self, id: &str) -> Option<&HistoryItem> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn latest(&self) -> Option<&HistoryItem> {
        self.items.first()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    /// Prepends `item`. Its timestamp is raised to the current front's if the
    /// clock went backwards, so the list stays newest-first.
    pub fn insert(&mut self, mut item: HistoryItem) -> &HistoryItem {
        if let Some(front) = self.items.first() {
            if item.timestamp < front.timestamp {
                log::debug!(
                    "Clamping timestamp of {} from {} to {}",
                    item.id,
                    item.timestamp,
                    front.timestamp
                );
                item.timestamp = front.timestamp;
            }
        }
        self.items.insert(0, item);
        self.persist();
        &self.items[0]
    }

    /// Returns whether a record was removed. Unknown ids are a no-op.
    pub fn delete(&mut self, id: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|item| item.id != id);
        let removed = self.items.len() != before;
        if removed {
            self.persist();
        } else {
            log::debug!("Delete of unknown history id {} ignored", id);
        }
        removed
    }

    /// Writes the first `cap` records. Failures are logged and swallowed.
    pub fn persist(&self) {
        let retained = &self.items[..self.items.len().min(self.cap)];
        let json = match serde_json::to_string(retained) {
            Ok(json) => json,
            Err(e) => {
                log::error!("Failed to serialize history: {}", e);
                return;
            }
        };
        match self.kv.save(&self.key, &json) {
            Ok(()) => log::debug!("Persisted {} history records", retained.len()),
            Err(e) => log::error!("Failed to persist history: {}", e),
        }
    }
}

fn load_items(kv: &dyn KeyValueStore, key: &str) -> Vec<HistoryItem> {
    let raw = match kv.load(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return Vec::new(),
        Err(e) => {
            log::error!("Failed to read history: {}", e);
            return Vec::new();
        }
    };

    let values = match serde_json::from_str::<Vec<serde_json::Value>>(&raw) {
        Ok(values) => values,
        Err(e) => {
            log::warn!("Discarding corrupted history at '{}': {}", key, e);
            if let Err(e) = kv.clear(key) {
                log::error!("Failed to clear corrupted history: {}", e);
            }
            return Vec::new();
        }
    };

    // One unreadable record never takes its siblings down with it.
    values
        .into_iter()
        .enumerate()
        .filter_map(|(index, value)| match serde_json::from_value::<HistoryItem>(value) {
            Ok(item) => Some(item.normalized()),
            Err(e) => {
                log::warn!("Skipping unreadable history record #{}: {}", index, e);
                None
            }
        })
        .collect()
}
