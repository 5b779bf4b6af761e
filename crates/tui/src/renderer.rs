use lanewise_protocol::{RenderCommand, TextAlign, ThemeToken};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier},
};

pub fn theme_to_color(token: ThemeToken) -> Color {
    match token {
        ThemeToken::CardCode => Color::Rgb(86, 156, 214),
        ThemeToken::CardFile => Color::Rgb(78, 201, 176),
        ThemeToken::CardSearch => Color::Rgb(197, 134, 192),
        ThemeToken::CardTask => Color::Rgb(220, 160, 90),
        ThemeToken::CardTerminal => Color::Rgb(120, 120, 200),
        ThemeToken::CardGit => Color::Rgb(240, 128, 48),
        ThemeToken::CardWeb => Color::Rgb(80, 170, 230),
        ThemeToken::CardDocument => Color::Rgb(180, 200, 90),
        ThemeToken::CardNeutral => Color::Rgb(70, 70, 80),
        ThemeToken::CardUser => Color::Rgb(50, 90, 60),
        ThemeToken::CardError => Color::Rgb(190, 50, 50),
        ThemeToken::CardCancelled => Color::Rgb(110, 100, 60),
        ThemeToken::CardMerged => Color::Gray,
        ThemeToken::LaneBackground => Color::Black,
        ThemeToken::LaneBorder => Color::DarkGray,
        ThemeToken::LaneHeaderBackground => Color::DarkGray,
        ThemeToken::LaneHeaderText => Color::White,
        ThemeToken::TextSecondary => Color::Gray,
        ThemeToken::TextMuted => Color::DarkGray,
        ThemeToken::SelectionHighlight => Color::Green,
        ThemeToken::HoverHighlight => Color::LightYellow,
        ThemeToken::BrushHighlight => Color::LightCyan,
        ThemeToken::Background => Color::Black,
        ThemeToken::Border => Color::DarkGray,
        ThemeToken::NoticeBackground => Color::Rgb(60, 20, 20),
        ThemeToken::NoticeText => Color::LightRed,
        ThemeToken::ButtonBackground => Color::Gray,
        ThemeToken::ButtonText => Color::Black,
    }
}

/// Foreground that stays readable on a given fill.
fn text_on(fill: ThemeToken) -> Color {
    match fill {
        ThemeToken::ButtonBackground => theme_to_color(ThemeToken::ButtonText),
        ThemeToken::LaneHeaderBackground => theme_to_color(ThemeToken::LaneHeaderText),
        _ => Color::White,
    }
}

/// Cell span `[start, end)` covering the half-open unit range
/// `[from, from + len)`, at least one cell wide.
fn cells(from: f64, len: f64) -> (i32, i32) {
    let start = from.floor() as i32;
    let end = ((from + len).ceil() as i32).max(start + 1);
    (start, end)
}

/// Paint render commands into `buf`. Coordinates are terminal cells; `area`
/// bounds everything drawn.
pub fn paint(commands: &[RenderCommand], area: Rect, buf: &mut Buffer) {
    let mut clip = area;
    for cmd in commands {
        match cmd {
            RenderCommand::DrawRect {
                rect,
                color,
                border_color,
                label,
                dimmed,
                ..
            } => {
                let (x0, x1) = cells(rect.x, rect.w);
                let (y0, y1) = cells(rect.y, rect.h);
                let Some(target) = cell_rect(x0, y0, x1, y1) else {
                    continue;
                };
                let region = target.intersection(clip);
                if region.is_empty() {
                    continue;
                }
                let bg = if *dimmed {
                    Color::Rgb(30, 30, 34)
                } else {
                    theme_to_color(*color)
                };
                let fg = if *dimmed {
                    theme_to_color(ThemeToken::TextMuted)
                } else {
                    text_on(*color)
                };
                for y in region.top()..region.bottom() {
                    for x in region.left()..region.right() {
                        buf[(x, y)].set_char(' ').set_bg(bg).set_fg(fg);
                    }
                }
                if let Some(border) = border_color {
                    // A left-edge bar stands in for the outline.
                    if target.left() >= region.left() {
                        for y in region.top()..region.bottom() {
                            buf[(target.left(), y)]
                                .set_char('▌')
                                .set_fg(theme_to_color(*border));
                        }
                    }
                }
                if let Some(label) = label {
                    let row = target.top();
                    if row >= region.top() && row < region.bottom() {
                        let start = target.left() + u16::from(border_color.is_some());
                        write_str(buf, region, start, row, label, fg, *dimmed);
                    }
                }
            }
            RenderCommand::DrawText {
                position,
                text,
                color,
                align,
                ..
            } => {
                let width = text.chars().count() as f64;
                let x = match align {
                    TextAlign::Left => position.x,
                    TextAlign::Center => position.x - width / 2.0,
                    TextAlign::Right => position.x - width,
                };
                let (x, y) = (x.floor(), position.y.floor());
                if x < 0.0 || y < 0.0 {
                    continue;
                }
                write_str(buf, clip, x as u16, y as u16, text, theme_to_color(*color), false);
            }
            RenderCommand::SetClip { rect } => {
                let (x0, x1) = cells(rect.x, rect.w);
                let (y0, y1) = cells(rect.y, rect.h);
                clip = cell_rect(x0, y0, x1, y1).map_or(Rect::default(), |r| r.intersection(area));
            }
            RenderCommand::ClearClip => clip = area,
            RenderCommand::BeginGroup { .. } | RenderCommand::EndGroup => {}
        }
    }
}

/// Clamp an `i32` cell box to the drawable `u16` plane.
fn cell_rect(x0: i32, y0: i32, x1: i32, y1: i32) -> Option<Rect> {
    let clamp = |v: i32| v.clamp(0, i32::from(u16::MAX)) as u16;
    let (x0, y0, x1, y1) = (clamp(x0), clamp(y0), clamp(x1), clamp(y1));
    (x1 > x0 && y1 > y0).then(|| Rect::new(x0, y0, x1 - x0, y1 - y0))
}

fn write_str(buf: &mut Buffer, bounds: Rect, x: u16, y: u16, text: &str, fg: Color, dim: bool) {
    if y < bounds.top() || y >= bounds.bottom() {
        return;
    }
    for (i, ch) in text.chars().enumerate() {
        let Some(cx) = x.checked_add(i as u16) else {
            break;
        };
        if cx >= bounds.right() {
            break;
        }
        if cx < bounds.left() {
            continue;
        }
        let cell = &mut buf[(cx, y)];
        cell.set_char(ch).set_fg(fg);
        if dim {
            cell.modifier.insert(Modifier::DIM);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lanewise_protocol::{Point, Rect as BoardRect};

    fn rect_cmd(rect: BoardRect, label: Option<&str>, dimmed: bool) -> RenderCommand {
        RenderCommand::DrawRect {
            rect,
            color: ThemeToken::CardTerminal,
            border_color: None,
            label: label.map(Into::into),
            target: None,
            dimmed,
        }
    }

    fn row(buf: &Buffer, y: u16) -> String {
        (0..buf.area.width).map(|x| buf[(x, y)].symbol()).collect()
    }

    #[test]
    fn fractional_rects_cover_whole_cells() {
        let area = Rect::new(0, 0, 10, 3);
        let mut buf = Buffer::empty(area);
        paint(
            &[rect_cmd(BoardRect::new(0.8, 1.0, 5.4, 0.9), Some("ls -la"), false)],
            area,
            &mut buf,
        );
        assert_eq!(row(&buf, 1), "ls -la    ");
        assert_eq!(buf[(0, 1)].bg, theme_to_color(ThemeToken::CardTerminal));
        assert_eq!(buf[(6, 1)].bg, theme_to_color(ThemeToken::CardTerminal));
        assert_eq!(buf[(7, 1)].bg, Color::Reset);
        assert_eq!(buf[(1, 0)].bg, Color::Reset);
    }

    #[test]
    fn clip_limits_drawing() {
        let area = Rect::new(0, 0, 10, 4);
        let mut buf = Buffer::empty(area);
        paint(
            &[
                RenderCommand::SetClip {
                    rect: BoardRect::new(0.0, 2.0, 10.0, 2.0),
                },
                rect_cmd(BoardRect::new(0.0, 1.0, 10.0, 2.0), Some("hidden"), false),
                RenderCommand::ClearClip,
            ],
            area,
            &mut buf,
        );
        assert_eq!(row(&buf, 1).trim(), "");
        assert_eq!(buf[(0, 2)].bg, theme_to_color(ThemeToken::CardTerminal));
    }

    #[test]
    fn dimmed_rects_are_muted() {
        let area = Rect::new(0, 0, 6, 1);
        let mut buf = Buffer::empty(area);
        paint(&[rect_cmd(BoardRect::new(0.0, 0.0, 6.0, 1.0), Some("x"), true)], area, &mut buf);
        assert_ne!(buf[(0, 0)].bg, theme_to_color(ThemeToken::CardTerminal));
        assert!(buf[(0, 0)].modifier.contains(Modifier::DIM));
    }

    #[test]
    fn centered_text() {
        let area = Rect::new(0, 0, 11, 1);
        let mut buf = Buffer::empty(area);
        paint(
            &[RenderCommand::DrawText {
                position: Point::new(5.5, 0.0),
                text: "abc".into(),
                color: ThemeToken::TextSecondary,
                font_size: 12.0,
                align: TextAlign::Center,
            }],
            area,
            &mut buf,
        );
        assert_eq!(row(&buf, 0), "    abc    ");
    }
}
