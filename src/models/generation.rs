use rand::Rng;
use serde::{Deserialize, Serialize};

pub const MAX_RANDOM_SEED: i64 = 1_000_000_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub prompt: String,
    pub seed: Option<i64>,
}

impl GenerateRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            seed: None,
        }
    }

    pub fn with_seed(mut self, seed: Option<i64>) -> Self {
        self.seed = seed;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub status: String,
    pub base64: String, // Raw base64, no data URI prefix
    pub prompt: String,
}

/// Best-effort error body. Every field may be missing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<ApiErrorDetail>,
    #[serde(default)]
    pub detail: Option<Vec<ValidationIssue>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorDetail {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ValidationIssue {
    #[serde(default)]
    pub loc: Vec<serde_json::Value>,
    #[serde(default)]
    pub msg: String,
    #[serde(rename = "type", default)]
    pub kind: String,
}

impl ApiErrorBody {
    /// Parses a body that may be empty, truncated or not JSON at all.
    pub fn parse(body: &str) -> Self {
        serde_json::from_str(body).unwrap_or_default()
    }

    pub fn message(&self) -> Option<String> {
        self.message
            .as_ref()
            .or_else(|| self.error.as_ref().and_then(|e| e.message.as_ref()))
            .filter(|m| !m.trim().is_empty())
            .cloned()
    }

    pub fn code(&self) -> Option<&str> {
        self.error.as_ref().and_then(|e| e.code.as_deref())
    }

    /// `"body.seed: value is not a valid integer; ..."` from FastAPI-style detail.
    pub fn validation_summary(&self) -> Option<String> {
        let issues = self.detail.as_ref().filter(|d| !d.is_empty())?;
        let parts: Vec<String> = issues
            .iter()
            .map(|issue| {
                let loc: Vec<String> = issue
                    .loc
                    .iter()
                    .map(|part| match part {
                        serde_json::Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect();
                if loc.is_empty() {
                    issue.msg.clone()
                } else {
                    format!("{}: {}", loc.join("."), issue.msg)
                }
            })
            .collect();
        Some(parts.join("; "))
    }
}

/// A seed in `1..=1_000_000_000`, for callers who want a reproducible value.
pub fn random_seed() -> i64 {
    rand::thread_rng().gen_range(1..=MAX_RANDOM_SEED)
}
