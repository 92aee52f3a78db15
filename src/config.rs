use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Engine settings.
///
/// Every field has a default so partial JSON documents are accepted:
///
/// ```
/// let cfg = vi_modal::EngineConfig::from_json(r#"{ "text_window": 512 }"#).unwrap();
/// assert_eq!(cfg.text_window, 512);
/// assert_eq!(cfg.max_count, 99_999);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Bytes read on each side of the cursor for text objects and find motions.
    pub text_window: usize,
    /// Pending counts saturate at this value.
    pub max_count: u32,
    /// Append the pending count to the mode indicator.
    pub show_count_in_status: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            text_window: 2048,
            max_count: 99_999,
            show_count_in_status: true,
        }
    }
}

impl EngineConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let mut config: EngineConfig = serde_json::from_str(json)?;
        config.text_window = config.text_window.max(1);
        config.max_count = config.max_count.max(1);
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
