use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::logger::redact;
use crate::storage::KeyValueStore;

/// The bearer token for the generation service, stored in plain text.
pub struct CredentialStore {
    kv: Arc<dyn KeyValueStore>,
    key: String,
}

impl CredentialStore {
    pub fn new(kv: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            kv,
            key: key.into(),
        }
    }

    /// Absent, blank and unreadable all read as no credential.
    pub fn load(&self) -> Option<String> {
        match self.kv.load(&self.key) {
            Ok(value) => value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty()),
            Err(e) => {
                log::error!("Failed to read API key: {}", e);
                None
            }
        }
    }

    pub fn save(&self, raw: &str) -> Result<String> {
        let key = raw.trim();
        if key.is_empty() {
            return Err(AppError::InvalidCredential);
        }
        self.kv.save(&self.key, key)?;
        log::info!("Saved API key {}", redact(key));
        Ok(key.to_string())
    }

    pub fn clear(&self) -> Result<()> {
        self.kv.clear(&self.key)?;
        log::info!("Cleared API key");
        Ok(())
    }

    pub fn masked(&self) -> Option<String> {
        self.load().map(|key| redact(&key))
    }
}
