use chrono::DateTime;
use lanewise_protocol::{HitTarget, Point, Rect, RenderCommand, SharedStr, TextAlign, ThemeToken};

use crate::classify::ToolVariant;
use crate::lane::CardView;
use crate::model::{Role, ZoomLevel};

use super::lane::format_tokens;

const DETAIL_FONT_SIZE: f64 = 11.0;

/// Per-card highlight state decided by the board.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CardStyle {
    pub selected: bool,
    pub hovered: bool,
    pub brush_active: bool,
}

/// Fill token for a card. Cancellation and errors win over the tool
/// variant; commits show as git.
pub fn card_color(card: &CardView) -> ThemeToken {
    if card.tags.is_cancelled {
        return ThemeToken::CardCancelled;
    }
    if card.has_error {
        return ThemeToken::CardError;
    }
    if card.role == Role::User && card.tags.tool.is_none() {
        return ThemeToken::CardUser;
    }
    match card.tags.icon_variant() {
        ToolVariant::Code => ThemeToken::CardCode,
        ToolVariant::File => ThemeToken::CardFile,
        ToolVariant::Search => ThemeToken::CardSearch,
        ToolVariant::Task => ThemeToken::CardTask,
        ToolVariant::Terminal => ThemeToken::CardTerminal,
        ToolVariant::Git => ThemeToken::CardGit,
        ToolVariant::Web => ThemeToken::CardWeb,
        ToolVariant::Document => ThemeToken::CardDocument,
        ToolVariant::Neutral => ThemeToken::CardNeutral,
    }
}

/// Pixel cards are bare color; skim shows the summary; detail adds nothing
/// here and draws a metadata line separately.
pub fn card_label(card: &CardView, zoom: ZoomLevel) -> Option<SharedStr> {
    match zoom {
        ZoomLevel::Pixel => None,
        _ if card.merged() => Some(format!("{} ×{}", card.summary, card.message_count).into()),
        _ => Some(card.summary.as_str().into()),
    }
}

fn border(card: &CardView, style: CardStyle) -> Option<ThemeToken> {
    if style.selected {
        Some(ThemeToken::SelectionHighlight)
    } else if style.hovered {
        Some(ThemeToken::HoverHighlight)
    } else if style.brush_active && card.matched {
        Some(ThemeToken::BrushHighlight)
    } else if card.merged() {
        Some(ThemeToken::CardMerged)
    } else {
        None
    }
}

fn meta_line(card: &CardView) -> String {
    let mut parts = vec![role_label(card.role).to_string()];
    if let Some(model) = &card.model {
        parts.push(model.clone());
    }
    if card.tokens > 0 {
        parts.push(format!("{} tok", format_tokens(card.tokens)));
    }
    if let Some(time) = card
        .timestamp_ms
        .and_then(DateTime::from_timestamp_millis)
        .map(|t| t.format("%H:%M:%S").to_string())
    {
        parts.push(time);
    }
    if card.tags.is_commit {
        parts.push(if card.tags.commit_verified { "commit ✓" } else { "commit" }.into());
    }
    parts.join(" · ")
}

fn role_label(role: Role) -> &'static str {
    match role {
        Role::User => "user",
        Role::Assistant => "assistant",
        Role::System => "system",
        Role::Summary => "summary",
        Role::Unknown => "unknown",
    }
}

pub fn render_card(
    lane_id: &SharedStr,
    card: &CardView,
    rect: Rect,
    zoom: ZoomLevel,
    style: CardStyle,
    out: &mut Vec<RenderCommand>,
) {
    out.push(RenderCommand::DrawRect {
        rect,
        color: card_color(card),
        border_color: border(card, style),
        label: card_label(card, zoom),
        target: Some(HitTarget::Card {
            lane_id: lane_id.clone(),
            uuid: card.uuid.clone(),
        }),
        dimmed: card.dimmed,
    });
    if zoom == ZoomLevel::Detail {
        let line = (rect.h / 3.0).min(DETAIL_FONT_SIZE * 1.5);
        out.push(RenderCommand::DrawText {
            position: Point::new(rect.x + (rect.w * 0.02).min(4.0), rect.bottom() - line),
            text: meta_line(card).into(),
            color: if card.dimmed {
                ThemeToken::TextMuted
            } else {
                ThemeToken::TextSecondary
            },
            font_size: DETAIL_FONT_SIZE,
            align: TextAlign::Left,
        });
    }
}
