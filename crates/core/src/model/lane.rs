use serde::{Deserialize, Serialize};

/// Information density of the board. Board-wide, never per lane.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZoomLevel {
    /// One thin colored bar per record.
    Pixel = 0,
    /// One labelled row per record.
    #[default]
    Skim = 1,
    /// Full card with summary and metadata lines.
    Detail = 2,
}

impl ZoomLevel {
    pub const ALL: [ZoomLevel; 3] = [Self::Pixel, Self::Skim, Self::Detail];

    pub fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(Self::Pixel),
            1 => Some(Self::Skim),
            2 => Some(Self::Detail),
            _ => None,
        }
    }

    pub fn next(self) -> Self {
        match self {
            Self::Pixel => Self::Skim,
            Self::Skim => Self::Detail,
            Self::Detail => Self::Pixel,
        }
    }

    /// Whether consecutive tool calls are folded into one unit.
    pub fn merges_siblings(self) -> bool {
        !matches!(self, Self::Detail)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Pixel => "pixel",
            Self::Skim => "skim",
            Self::Detail => "detail",
        }
    }
}

impl std::fmt::Display for ZoomLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Per-snapshot aggregates shown in a lane header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaneStats {
    pub total_tokens: u64,
    pub error_count: usize,
    pub record_count: usize,
    pub visible_count: usize,
}
