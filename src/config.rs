use std::env;
use std::path::PathBuf;

pub const DEFAULT_API_URL: &str = "https://nxugwxervbsraegfxjsv.supabase.co/functions/v1/z-image-api";
pub const HISTORY_KEY: &str = "z_image_history";
pub const CREDENTIAL_KEY: &str = "z_image_api_key";
pub const DEFAULT_HISTORY_CAP: usize = 20;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_url: String,
    pub data_dir: PathBuf,
    pub history_key: String,
    pub credential_key: String,
    pub history_cap: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            api_url: DEFAULT_API_URL.to_string(),
            data_dir: default_data_dir(),
            history_key: HISTORY_KEY.to_string(),
            credential_key: CREDENTIAL_KEY.to_string(),
            history_cap: DEFAULT_HISTORY_CAP,
        }
    }
}

impl AppConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads `ZIMAGE_API_URL`, `ZIMAGE_DATA_DIR` and `ZIMAGE_HISTORY_CAP`.
    /// Call `dotenv::dotenv()` beforehand to pick up a `.env` file.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(url) = env::var("ZIMAGE_API_URL") {
            if !url.trim().is_empty() {
                config.api_url = url.trim().to_string();
            }
        }

        if let Ok(dir) = env::var("ZIMAGE_DATA_DIR") {
            if !dir.trim().is_empty() {
                config.data_dir = PathBuf::from(dir.trim());
            }
        }

        if let Ok(raw) = env::var("ZIMAGE_HISTORY_CAP") {
            match raw.trim().parse::<usize>() {
                Ok(cap) if cap > 0 => config.history_cap = cap,
                _ => log::warn!(
                    "Ignoring ZIMAGE_HISTORY_CAP={:?}, using {}",
                    raw,
                    DEFAULT_HISTORY_CAP
                ),
            }
        }

        config
    }

    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }

    pub fn with_history_cap(mut self, cap: usize) -> Self {
        self.history_cap = cap.max(1);
        self
    }

    pub fn with_keys(
        mut self,
        history_key: impl Into<String>,
        credential_key: impl Into<String>,
    ) -> Self {
        self.history_key = history_key.into();
        self.credential_key = credential_key.into();
        self
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join("zimage"))
        .unwrap_or_else(|| PathBuf::from(".zimage"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::new();
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.history_key, "z_image_history");
        assert_eq!(config.credential_key, "z_image_api_key");
        assert_eq!(config.history_cap, 20);
    }

    #[test]
    fn test_builders() {
        let config = AppConfig::new()
            .with_api_url("http://127.0.0.1:9/generate")
            .with_data_dir("/tmp/zimage-test")
            .with_history_cap(0);
        assert_eq!(config.api_url, "http://127.0.0.1:9/generate");
        assert_eq!(config.data_dir, PathBuf::from("/tmp/zimage-test"));
        assert_eq!(config.history_cap, 1);
    }
}
