use lanewise_protocol::{HitTarget, Point, Rect, RenderCommand, TextAlign, ThemeToken, Viewport};

pub const EMPTY_MESSAGE: &str = "No sessions to compare";
pub const RELOAD_LABEL: &str = "Reload";

const NOTICE_FONT_SIZE: f64 = 14.0;

fn centered_text(viewport: &Viewport, y: f64, text: &str, color: ThemeToken) -> RenderCommand {
    RenderCommand::DrawText {
        position: Point::new(viewport.x + viewport.width / 2.0, y),
        text: text.into(),
        color,
        font_size: NOTICE_FONT_SIZE,
        align: TextAlign::Center,
    }
}

fn background(viewport: &Viewport, color: ThemeToken) -> RenderCommand {
    RenderCommand::DrawRect {
        rect: viewport.rect(),
        color,
        border_color: None,
        label: None,
        target: None,
        dimmed: false,
    }
}

/// Shown instead of an empty grid when no lane is visible.
pub fn render_empty_state(viewport: &Viewport) -> Vec<RenderCommand> {
    vec![
        RenderCommand::BeginGroup {
            id: "empty-state".into(),
            label: None,
        },
        background(viewport, ThemeToken::Background),
        centered_text(
            viewport,
            viewport.y + viewport.height / 2.0,
            EMPTY_MESSAGE,
            ThemeToken::TextMuted,
        ),
        RenderCommand::EndGroup,
    ]
}

/// Local failure notice with a manual reload button.
pub fn render_failure(viewport: &Viewport, message: &str) -> Vec<RenderCommand> {
    let mid = viewport.y + viewport.height / 2.0;
    let button_w = (viewport.width / 4.0).clamp(1.0, 120.0);
    let button_h = (viewport.height / 8.0).clamp(1.0, 28.0);
    let button = Rect::new(
        viewport.x + (viewport.width - button_w) / 2.0,
        mid + button_h,
        button_w,
        button_h,
    );
    vec![
        RenderCommand::BeginGroup {
            id: "render-failure".into(),
            label: Some("Board failed to render".into()),
        },
        background(viewport, ThemeToken::NoticeBackground),
        centered_text(
            viewport,
            mid - button_h,
            "The board could not be drawn.",
            ThemeToken::NoticeText,
        ),
        centered_text(viewport, mid, message, ThemeToken::TextSecondary),
        RenderCommand::DrawRect {
            rect: button,
            color: ThemeToken::ButtonBackground,
            border_color: Some(ThemeToken::Border),
            label: Some(RELOAD_LABEL.into()),
            target: Some(HitTarget::Reload),
            dimmed: false,
        },
        RenderCommand::EndGroup,
    ]
}
