use std::path::Path;

use anyhow::{Context, Result};
use lanewise_core::BoardConfig;
use serde::{Deserialize, Serialize};

/// `lanewise.toml`. Every field is optional.
///
/// ```toml
/// scroll_step = 3
///
/// [board]
/// sync_scroll = false
/// pan_modifier = "ctrl"
/// initial_zoom = "detail"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TuiConfig {
    pub board: BoardConfig,
    /// Rows moved per arrow key or wheel notch.
    pub scroll_step: f64,
    /// Input poll interval in milliseconds.
    pub tick_ms: u64,
}

impl Default for TuiConfig {
    fn default() -> Self {
        Self {
            board: BoardConfig::terminal(),
            scroll_step: 1.0,
            tick_ms: 100,
        }
    }
}

/// Overlay `patch` onto `base`, table by table.
fn merge(base: &mut toml::Value, patch: toml::Value) {
    match (base, patch) {
        (toml::Value::Table(base), toml::Value::Table(patch)) => {
            for (key, value) in patch {
                match base.get_mut(&key) {
                    Some(slot) => merge(slot, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

impl TuiConfig {
    /// Parse a config file on top of the terminal defaults, so a partial
    /// `[board]` table keeps cell-sized lanes.
    pub fn parse(text: &str) -> Result<Self> {
        let mut value = toml::Value::try_from(Self::default())?;
        merge(&mut value, toml::from_str(text)?);
        let config: Self = value.try_into()?;
        config.board.validate()?;
        Ok(config)
    }

    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config at {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("Failed to parse config at {}", path.display()))
    }
}
