use serde::{Deserialize, Serialize};

/// Semantic color tokens resolved by the renderer's active theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ThemeToken {
    // Card fills, one per tool variant
    CardCode,
    CardFile,
    CardSearch,
    CardTask,
    CardTerminal,
    CardGit,
    CardWeb,
    CardDocument,
    CardNeutral,
    CardUser,

    // Card state overlays
    CardError,
    CardCancelled,
    CardMerged,

    LaneBackground,
    LaneBorder,
    LaneHeaderBackground,
    LaneHeaderText,

    TextSecondary,
    TextMuted,

    SelectionHighlight,
    HoverHighlight,
    BrushHighlight,

    Background,
    Border,

    NoticeBackground,
    NoticeText,
    ButtonBackground,
    ButtonText,
}
