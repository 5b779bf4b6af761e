//! Board layout and behaviour settings.
//!
//! Every field has a default so a partial config file (or none) is valid.
//! Units are whatever the renderer draws in: logical pixels for the
//! default preset, terminal cells for [`BoardConfig::terminal`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ZoomLevel;
use crate::window::DEFAULT_OVERSCAN;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{field} must be a positive, finite number (got {value})")]
    NotPositive { field: &'static str, value: f64 },
    #[error("row sizes must grow with zoom: pixel {pixel} <= skim {skim} <= detail {detail}")]
    RowSizeOrder { pixel: f64, skim: f64, detail: f64 },
}

/// Modifier that turns a pointer drag into a board pan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PanModifier {
    Ctrl,
    #[default]
    Alt,
    Shift,
}

/// Estimated record extent per zoom level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RowSizes {
    pub pixel: f64,
    pub skim: f64,
    pub detail: f64,
    /// Added per extra text line at detail zoom, up to `detail_max_lines`.
    pub detail_line: f64,
    pub detail_max_lines: usize,
}

impl Default for RowSizes {
    fn default() -> Self {
        Self {
            pixel: 4.0,
            skim: 28.0,
            detail: 72.0,
            detail_line: 16.0,
            detail_max_lines: 3,
        }
    }
}

impl RowSizes {
    pub fn base(&self, zoom: ZoomLevel) -> f64 {
        match zoom {
            ZoomLevel::Pixel => self.pixel,
            ZoomLevel::Skim => self.skim,
            ZoomLevel::Detail => self.detail,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    pub overscan: usize,
    pub row_size: RowSizes,
    pub lane_width: f64,
    pub lane_gap: f64,
    pub header_height: f64,
    /// Passive scroll sync between lanes.
    pub sync_scroll: bool,
    pub pan_modifier: PanModifier,
    /// Card summaries are cut to this many characters.
    pub summary_chars: usize,
    pub initial_zoom: ZoomLevel,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            overscan: DEFAULT_OVERSCAN,
            row_size: RowSizes::default(),
            lane_width: 320.0,
            lane_gap: 12.0,
            header_height: 48.0,
            sync_scroll: true,
            pan_modifier: PanModifier::default(),
            summary_chars: 80,
            initial_zoom: ZoomLevel::Skim,
        }
    }
}

impl BoardConfig {
    /// Cell-based layout for terminal renderers.
    pub fn terminal() -> Self {
        Self {
            overscan: 2,
            row_size: RowSizes {
                pixel: 1.0,
                skim: 1.0,
                detail: 3.0,
                detail_line: 1.0,
                detail_max_lines: 2,
            },
            lane_width: 40.0,
            lane_gap: 1.0,
            header_height: 2.0,
            summary_chars: 60,
            ..Self::default()
        }
    }

    /// Horizontal pitch of one lane column.
    pub fn column_pitch(&self) -> f64 {
        self.lane_width + self.lane_gap
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("row_size.pixel", self.row_size.pixel),
            ("row_size.skim", self.row_size.skim),
            ("row_size.detail", self.row_size.detail),
            ("lane_width", self.lane_width),
        ];
        for (field, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::NotPositive { field, value });
            }
        }
        let non_negative = [
            ("lane_gap", self.lane_gap),
            ("header_height", self.header_height),
            ("row_size.detail_line", self.row_size.detail_line),
        ];
        for (field, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigError::NotPositive { field, value });
            }
        }
        let RowSizes {
            pixel,
            skim,
            detail,
            ..
        } = self.row_size;
        if !(pixel <= skim && skim <= detail) {
            return Err(ConfigError::RowSizeOrder {
                pixel,
                skim,
                detail,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_are_valid() {
        assert_eq!(BoardConfig::default().validate(), Ok(()));
        assert_eq!(BoardConfig::terminal().validate(), Ok(()));
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config: BoardConfig =
            serde_json::from_str(r#"{ "lane_width": 200, "row_size": { "skim": 30 } }"#)
                .unwrap_or_default();
        assert_eq!(config.lane_width, 200.0);
        assert_eq!(config.row_size.skim, 30.0);
        assert_eq!(config.row_size.pixel, 4.0);
        assert!(config.sync_scroll);
    }

    #[test]
    fn rejects_shrinking_rows() {
        let mut config = BoardConfig::default();
        config.row_size.detail = 2.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::RowSizeOrder { .. })
        ));
    }

    #[test]
    fn rejects_zero_width() {
        let config = BoardConfig {
            lane_width: 0.0,
            ..BoardConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::NotPositive {
                field: "lane_width",
                value: 0.0
            })
        );
    }
}
