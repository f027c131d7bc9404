use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;

use crate::{
    config::AppConfig,
    credentials::CredentialStore,
    error::{AppError, Result},
    history::HistoryStore,
    models::{GenerateRequest, HistoryItem},
    service::{GenerationClient, HttpTransport, Transport},
    storage::{FileKeyValueStore, KeyValueStore},
};

/// Headless state of the generator: history, credential, the record on
/// display and the last error shown to the user.
pub struct Studio {
    history: HistoryStore,
    credentials: CredentialStore,
    client: GenerationClient,
    active: Option<String>,
    last_error: Option<String>,
}

impl Studio {
    pub fn new(config: &AppConfig, kv: Arc<dyn KeyValueStore>, transport: Arc<dyn Transport>) -> Self {
        Self {
            history: HistoryStore::open(kv.clone(), config.history_key.as_str(), config.history_cap),
            credentials: CredentialStore::new(kv, config.credential_key.as_str()),
            client: GenerationClient::new(transport, config.api_url.as_str()),
            active: None,
            last_error: None,
        }
    }

    /// File-backed store under `config.data_dir` and a reqwest transport.
    pub fn open(config: &AppConfig) -> Result<Self> {
        let kv = FileKeyValueStore::new(&config.data_dir)?;
        log::debug!("Using data directory {}", kv.dir().display());
        Ok(Self::new(config, Arc::new(kv), Arc::new(HttpTransport::new())))
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn active_id(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub fn active(&self) -> Option<&HistoryItem> {
        self.active.as_deref().and_then(|id| self.history.get(id))
    }

    /// Runs one generation. On success the new record is stored and shown.
    /// On failure only `last_error` changes.
    pub async fn generate(&mut self, prompt: &str, seed: Option<i64>) -> Result<HistoryItem> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(AppError::EmptyPrompt);
        }

        self.last_error = None;
        let credential = self.credentials.load();
        let request = GenerateRequest::new(prompt).with_seed(seed);

        match self.client.generate(credential.as_deref(), &request).await {
            Ok(response) => {
                let item = HistoryItem::from_response(response, seed);
                let stored = self.history.insert(item).clone();
                log::info!("Stored generation {}", stored.id);
                self.active = Some(stored.id.clone());
                Ok(stored)
            }
            Err(e) => {
                self.last_error = Some(e.to_string());
                Err(e.into())
            }
        }
    }

    pub fn select(&mut self, id: &str) -> Result<&HistoryItem> {
        if self.history.get(id).is_none() {
            return Err(AppError::NotFound(id.to_string()));
        }
        self.active = Some(id.to_string());
        self.active().ok_or_else(|| AppError::NotFound(id.to_string()))
    }

    /// Removes a record, unknown ids included. Returns whether one was removed.
    pub fn delete(&mut self, id: &str) -> bool {
        let removed = self.history.delete(id);
        if self.active.as_deref() == Some(id) {
            self.active = None;
        }
        removed
    }

    /// Writes the record's PNG bytes to `path`, or to `z-turbo-<ms>.png` in
    /// the working directory.
    pub fn export(&self, id: &str, path: Option<&Path>) -> Result<PathBuf> {
        let item = self
            .history
            .get(id)
            .ok_or_else(|| AppError::NotFound(id.to_string()))?;
        let bytes = item.image_bytes()?;

        let target = match path {
            Some(path) => path.to_path_buf(),
            None => default_export_name(),
        };
        fs::write(&target, bytes).map_err(|e| AppError::Storage(e.into()))?;
        log::info!("Exported {} to {}", id, target.display());
        Ok(target)
    }
}

pub fn default_export_name() -> PathBuf {
    PathBuf::from(format!("z-turbo-{}.png", Utc::now().timestamp_millis()))
}
