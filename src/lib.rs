pub mod config;
pub mod credentials;
pub mod error;
pub mod history;
pub mod logger;
pub mod models;
pub mod service;
pub mod storage;
pub mod studio;

pub use config::AppConfig;
pub use credentials::CredentialStore;
pub use error::{AppError, GenerationError, Result, StorageError};
pub use history::HistoryStore;
pub use models::{GenerateRequest, GenerateResponse, HistoryItem};
pub use service::{GenerationClient, HttpTransport, Transport};
pub use storage::{FileKeyValueStore, KeyValueStore, MemoryKeyValueStore};
pub use studio::Studio;
