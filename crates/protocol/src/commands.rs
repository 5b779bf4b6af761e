use serde::{Deserialize, Serialize};

use crate::shared_str::SharedStr;
use crate::theme::ThemeToken;
use crate::types::{Point, Rect};

/// A single, stateless render instruction.
///
/// The board emits a `Vec<RenderCommand>` per pass. Renderers consume the
/// list in order; every command carries all the data it needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RenderCommand {
    /// Draw a filled rectangle, optionally labelled and hit-testable.
    ///
    /// `dimmed` asks the renderer to de-emphasize the rect (reduced alpha or
    /// muted glyphs). It never changes geometry.
    DrawRect {
        rect: Rect,
        color: ThemeToken,
        border_color: Option<ThemeToken>,
        label: Option<SharedStr>,
        target: Option<HitTarget>,
        dimmed: bool,
    },

    DrawText {
        position: Point,
        text: SharedStr,
        color: ThemeToken,
        font_size: f64,
        align: TextAlign,
    },

    /// Restrict subsequent drawing to a rectangular region.
    SetClip { rect: Rect },

    ClearClip,

    /// Begin a logical group (the board, one lane). Renderers may use this
    /// for layering or accessibility.
    BeginGroup {
        id: SharedStr,
        label: Option<SharedStr>,
    },

    EndGroup,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

/// What a pointer lands on when it hits a rect.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HitTarget {
    /// An interaction card. `uuid` is the first record the card covers.
    Card { lane_id: SharedStr, uuid: SharedStr },
    LaneHeader { lane_id: SharedStr },
    /// The manual reload affordance of the render-failure notice.
    Reload,
}

impl RenderCommand {
    pub fn target(&self) -> Option<&HitTarget> {
        match self {
            Self::DrawRect { target, .. } => target.as_ref(),
            _ => None,
        }
    }
}
