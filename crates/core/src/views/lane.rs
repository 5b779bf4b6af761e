use lanewise_protocol::{HitTarget, Point, Rect, RenderCommand, SharedStr, TextAlign, ThemeToken};

use crate::model::LaneStats;

const HEADER_FONT_SIZE: f64 = 12.0;

/// `950`, `12.3k`, `4.1M`.
pub fn format_tokens(tokens: u64) -> String {
    match tokens {
        0..1_000 => tokens.to_string(),
        1_000..1_000_000 => format!("{:.1}k", tokens as f64 / 1e3),
        _ => format!("{:.1}M", tokens as f64 / 1e6),
    }
}

pub fn stats_line(stats: &LaneStats) -> String {
    format!(
        "{} tok · {} err · {} msgs",
        format_tokens(stats.total_tokens),
        stats.error_count,
        stats.visible_count
    )
}

/// Lane title bar with its aggregate stats. Clickable as a whole.
pub fn render_lane_header(
    lane_id: &SharedStr,
    title: &str,
    stats: &LaneStats,
    rect: Rect,
    out: &mut Vec<RenderCommand>,
) {
    out.push(RenderCommand::DrawRect {
        rect,
        color: ThemeToken::LaneHeaderBackground,
        border_color: Some(ThemeToken::LaneBorder),
        label: Some(title.into()),
        target: Some(HitTarget::LaneHeader {
            lane_id: lane_id.clone(),
        }),
        dimmed: false,
    });
    out.push(RenderCommand::DrawText {
        position: Point::new(rect.x + (rect.w * 0.02).min(4.0), rect.bottom() - (rect.h / 2.0).min(HEADER_FONT_SIZE * 1.5)),
        text: stats_line(stats).into(),
        color: ThemeToken::TextSecondary,
        font_size: HEADER_FONT_SIZE,
        align: TextAlign::Left,
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_formatting() {
        assert_eq!(format_tokens(0), "0");
        assert_eq!(format_tokens(999), "999");
        assert_eq!(format_tokens(12_345), "12.3k");
        assert_eq!(format_tokens(4_100_000), "4.1M");
    }

    #[test]
    fn zero_stats_header() {
        let mut out = Vec::new();
        render_lane_header(
            &"s1".into(),
            "empty",
            &LaneStats::default(),
            Rect::new(0.0, 0.0, 320.0, 48.0),
            &mut out,
        );
        assert_eq!(out.len(), 2);
        assert_eq!(
            out[0].target(),
            Some(&HitTarget::LaneHeader {
                lane_id: "s1".into()
            })
        );
        assert!(matches!(
            &out[1],
            RenderCommand::DrawText { text, .. } if text.as_str() == "0 tok · 0 err · 0 msgs"
        ));
    }
}
