use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::Utc;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::generation::GenerateResponse;

pub const DATA_URI_PREFIX: &str = "data:image/png;base64,";

/// One completed generation, as persisted in the history list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryItem {
    pub id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub prompt: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub base64: String,
    pub timestamp: i64,
    #[serde(default, deserialize_with = "lenient_seed")]
    pub seed: Option<i64>,
}

/// `null` and non-string values read as an empty string.
fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        _ => String::new(),
    })
}

/// Accepts integers, finite fractions (truncated) and numeric strings.
/// Anything else reads as no seed.
fn lenient_seed<'de, D>(deserializer: D) -> std::result::Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let seed = match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    Ok(seed)
}

impl HistoryItem {
    /// Wraps a successful response. The server-echoed prompt is the one kept.
    pub fn from_response(response: GenerateResponse, seed: Option<i64>) -> Self {
        let timestamp = Utc::now().timestamp_millis();
        Self {
            id: new_id(timestamp),
            prompt: response.prompt,
            base64: to_data_uri(&response.base64),
            timestamp,
            seed,
        }
    }

    pub fn normalized(mut self) -> Self {
        self.base64 = normalize_data_uri(&self.base64);
        self
    }

    /// The raw base64 payload behind the data URI prefix.
    pub fn payload(&self) -> &str {
        self.base64
            .strip_prefix(DATA_URI_PREFIX)
            .unwrap_or(&self.base64)
    }

    pub fn image_bytes(&self) -> Result<Vec<u8>> {
        STANDARD
            .decode(self.payload().trim())
            .map_err(|e| AppError::Decode(e.to_string()))
    }
}

/// `"{ms}-{8 hex}"`, sortable by creation time and unique per process run.
pub fn new_id(timestamp_ms: i64) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}-{}", timestamp_ms, &suffix[..8])
}

/// Prefixes a freshly generated payload. Unlike load-time repair, an empty
/// payload still gets the prefix.
pub fn to_data_uri(raw: &str) -> String {
    if raw.is_empty() {
        return DATA_URI_PREFIX.to_string();
    }
    normalize_data_uri(raw)
}

/// Repairs the two known corruption shapes of a stored image payload.
///
/// A run of leading prefixes collapses to one and a bare payload gets the
/// prefix prepended. Empty values and anything else pass through unchanged.
/// Applying it twice yields the same value as applying it once.
pub fn normalize_data_uri(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }

    let mut rest = raw;
    let mut prefixes = 0;
    while let Some(stripped) = rest.strip_prefix(DATA_URI_PREFIX) {
        rest = stripped;
        prefixes += 1;
    }

    match prefixes {
        1 => raw.to_string(),
        _ => format!("{}{}", DATA_URI_PREFIX, rest),
    }
}
