use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent,
    MouseEventKind,
};
use lanewise_core::brush::{ActiveBrush, BrushKind, DOC_WILDCARD};
use lanewise_core::loaders::load_paths;
use lanewise_core::model::{LaneData, ToolInput};
use lanewise_core::views::format_tokens;
use lanewise_core::{Board, BoardEvent, PanModifier, ZoomLevel};
use lanewise_protocol::{Point, SharedStr, Viewport};
use ratatui::{
    DefaultTerminal, Frame,
    layout::{Constraint, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
};
use tracing::{debug, warn};

use crate::config::TuiConfig;
use crate::renderer;

/// Record shown in the side panel.
#[derive(Debug, Clone, PartialEq)]
pub struct Detail {
    pub lane_id: SharedStr,
    pub uuid: SharedStr,
    pub thread: Vec<SharedStr>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

pub struct App {
    board: Board,
    paths: Vec<PathBuf>,
    scroll_step: f64,
    tick: Duration,
    pan_modifier: KeyModifiers,
    focus: usize,
    detail: Option<Detail>,
    status: String,
}

fn modifier_keys(modifier: PanModifier) -> KeyModifiers {
    match modifier {
        PanModifier::Ctrl => KeyModifiers::CONTROL,
        PanModifier::Alt => KeyModifiers::ALT,
        PanModifier::Shift => KeyModifiers::SHIFT,
    }
}

impl App {
    pub fn new(config: TuiConfig, paths: Vec<PathBuf>, lanes: Vec<LaneData>) -> Self {
        let pan_modifier = modifier_keys(config.board.pan_modifier);
        let mut board = Board::new(config.board);
        board.set_sessions(lanes);
        Self {
            board,
            paths,
            scroll_step: config.scroll_step,
            tick: Duration::from_millis(config.tick_ms),
            pan_modifier,
            focus: 0,
            detail: None,
            status: String::new(),
        }
    }

    pub fn run(mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        loop {
            terminal.draw(|frame| self.draw(frame))?;
            if event::poll(self.tick)? {
                let flow = match event::read()? {
                    Event::Key(key) if key.kind == KeyEventKind::Press => self.on_key(key),
                    Event::Mouse(mouse) => {
                        self.on_mouse(mouse);
                        Flow::Continue
                    }
                    _ => Flow::Continue,
                };
                if flow == Flow::Quit {
                    return Ok(());
                }
            }
            self.absorb_events();
            self.board.idle_tick();
        }
    }

    fn focused_lane(&self) -> Option<SharedStr> {
        self.board.visible_lanes().get(self.focus).cloned()
    }

    /// One page: the height of a lane body.
    fn body_rows(&self) -> f64 {
        self.board
            .lanes()
            .first()
            .map_or(10.0, |l| l.window().container_extent.max(1.0))
    }

    fn scroll_focused(&mut self, delta: f64) {
        let Some(id) = self.focused_lane() else {
            return;
        };
        if let Err(err) = self.board.scroll_lane_by(&id, delta) {
            debug!(%err, "scroll ignored");
        }
    }

    fn move_focus(&mut self, delta: isize) {
        let count = self.board.visible_lanes().len();
        if count == 0 {
            return;
        }
        self.focus = self.focus.saturating_add_signed(delta).min(count - 1);
        self.board.reveal_column(self.focus);
    }

    fn select_top_of_focused(&mut self) {
        let Some(id) = self.focused_lane() else {
            return;
        };
        let uuid = self.board.lane(&id).and_then(|lane| {
            let top = lane.anchor().index;
            lane.visible_records().nth(top).map(|r| r.uuid.clone())
        });
        if let Some(uuid) = uuid {
            if let Err(err) = self.board.select_interaction(&id, &uuid) {
                debug!(%err, "selection ignored");
            }
        }
    }

    fn toggle_model_brush(&mut self) {
        let model = self.detail.as_ref().and_then(|d| {
            self.board
                .lane(&d.lane_id)
                .and_then(|l| l.record(&d.uuid))
                .and_then(|r| r.model.clone())
        });
        match model {
            Some(model) => self.board.toggle_brush(ActiveBrush::new(BrushKind::Model, model)),
            None => self.status = "select an assistant record to brush by model".into(),
        }
    }

    fn reload_from_disk(&mut self) {
        let (lanes, failures) = load_paths(&self.paths);
        for (path, err) in &failures {
            warn!(path = %path.display(), %err, "reload failed");
        }
        self.status = match failures.len() {
            0 => format!("reloaded {} sessions", lanes.len()),
            n => format!("reloaded {} sessions, {n} failed", lanes.len()),
        };
        self.board.set_sessions(lanes);
        self.board.reload();
        let count = self.board.visible_lanes().len();
        self.focus = self.focus.min(count.saturating_sub(1));
    }

    fn on_key(&mut self, key: KeyEvent) -> Flow {
        match key.code {
            KeyCode::Char('q') => return Flow::Quit,
            KeyCode::Esc => {
                if self.detail.is_some() {
                    self.detail = None;
                } else if self.board.brush().is_some() {
                    self.board.set_brush(None);
                } else {
                    return Flow::Quit;
                }
            }
            KeyCode::Char(c @ '1'..='3') => {
                let index = c as u8 - b'1';
                if let Some(zoom) = ZoomLevel::from_index(index) {
                    self.board.set_zoom(zoom);
                }
            }
            KeyCode::Char('z') => self.board.cycle_zoom(),
            KeyCode::Up | KeyCode::Char('k') => self.scroll_focused(-self.scroll_step),
            KeyCode::Down | KeyCode::Char('j') => self.scroll_focused(self.scroll_step),
            KeyCode::PageUp => self.scroll_focused(-self.body_rows()),
            KeyCode::PageDown => self.scroll_focused(self.body_rows()),
            KeyCode::Home => self.scroll_focused(f64::MIN / 2.0),
            KeyCode::End => self.scroll_focused(f64::MAX / 2.0),
            KeyCode::Left | KeyCode::Char('h') => self.move_focus(-1),
            KeyCode::Right | KeyCode::Char('l') => self.move_focus(1),
            KeyCode::Char('e') => self.board.toggle_brush(ActiveBrush::errors()),
            KeyCode::Char('t') => self.board.toggle_brush(ActiveBrush::any_tool()),
            KeyCode::Char('c') => self
                .board
                .toggle_brush(ActiveBrush::new(BrushKind::Status, "commit")),
            KeyCode::Char('d') => self
                .board
                .toggle_brush(ActiveBrush::new(BrushKind::File, DOC_WILDCARD)),
            KeyCode::Char('m') => self.toggle_model_brush(),
            KeyCode::Char('s') => {
                let enabled = !self.board.config().sync_scroll;
                self.board.set_sync_enabled(enabled);
                self.status = format!("scroll sync {}", if enabled { "on" } else { "off" });
            }
            KeyCode::Enter => self.select_top_of_focused(),
            KeyCode::Char('r') => self.reload_from_disk(),
            _ => {}
        }
        Flow::Continue
    }

    fn on_mouse(&mut self, mouse: MouseEvent) {
        let point = Point::new(f64::from(mouse.column) + 0.5, f64::from(mouse.row) + 0.5);
        let modifier_held = mouse.modifiers.contains(self.pan_modifier);
        let wheel = self.scroll_step * 3.0;
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                if let Some(i) = self
                    .board
                    .lane_at(point)
                    .and_then(|id| self.board.visible_lanes().iter().position(|v| v == id))
                {
                    self.focus = i;
                }
                if !self.board.begin_pan(point, modifier_held) {
                    self.board.click(point);
                }
            }
            MouseEventKind::Drag(MouseButton::Left) => {
                if self.board.is_panning() {
                    self.board.pan_move(point, modifier_held);
                }
            }
            MouseEventKind::Up(MouseButton::Left) => self.board.end_pan(),
            MouseEventKind::Moved => self.board.hover(point),
            MouseEventKind::ScrollDown | MouseEventKind::ScrollUp => {
                let delta = if mouse.kind == MouseEventKind::ScrollDown {
                    wheel
                } else {
                    -wheel
                };
                if let Some(id) = self.board.lane_at(point).cloned() {
                    if let Err(err) = self.board.scroll_lane_by(&id, delta) {
                        debug!(%err, "wheel ignored");
                    }
                }
            }
            MouseEventKind::ScrollLeft => self.board.scroll_columns(-self.board.config().column_pitch()),
            MouseEventKind::ScrollRight => self.board.scroll_columns(self.board.config().column_pitch()),
            _ => {}
        }
    }

    fn absorb_events(&mut self) {
        for event in self.board.drain_events() {
            match event {
                BoardEvent::InteractionSelected {
                    uuid,
                    lane_id,
                    thread,
                    ..
                } => {
                    self.detail = Some(Detail {
                        lane_id,
                        uuid,
                        thread,
                    });
                }
                BoardEvent::SelectionCleared => self.detail = None,
                BoardEvent::BrushChanged { brush } => {
                    self.status = match brush {
                        Some(brush) => format!("brush {brush}"),
                        None => "brush cleared".into(),
                    };
                }
                BoardEvent::ZoomChanged { zoom } => self.status = format!("zoom {zoom}"),
                BoardEvent::RenderFailed { message } => {
                    self.status = format!("render failed: {message} (r to reload)");
                }
            }
        }
    }

    fn draw(&mut self, frame: &mut Frame<'_>) {
        let [main, status] =
            Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).areas(frame.area());
        let board_area = match &self.detail {
            Some(detail) => {
                let [board_area, panel] =
                    Layout::horizontal([Constraint::Min(20), Constraint::Percentage(38)]).areas(main);
                let lines = detail_lines(&self.board, detail);
                let title = format!(" {} ", detail.uuid);
                frame.render_widget(
                    Paragraph::new(lines)
                        .wrap(Wrap { trim: false })
                        .block(Block::default().borders(Borders::LEFT).title(title)),
                    panel,
                );
                board_area
            }
            None => main,
        };

        let viewport = Viewport {
            x: f64::from(board_area.x),
            y: f64::from(board_area.y),
            width: f64::from(board_area.width),
            height: f64::from(board_area.height),
            dpr: 1.0,
        };
        let commands = self.board.render(&viewport);
        renderer::paint(&commands, board_area, frame.buffer_mut());

        frame.render_widget(
            Paragraph::new(status_line(&self.board, self.focus, &self.status))
                .style(Style::default().fg(Color::White).bg(Color::DarkGray)),
            status,
        );
    }
}

fn status_line(board: &Board, focus: usize, status: &str) -> Line<'static> {
    let brush = board
        .brush()
        .map_or_else(|| "none".to_string(), ToString::to_string);
    let lane = board
        .visible_lanes()
        .get(focus)
        .and_then(|id| board.lane(id))
        .map_or_else(String::new, |l| format!("{} · ", l.title()));
    let sync = if board.config().sync_scroll { "sync" } else { "free" };
    let mut spans = vec![
        Span::styled(
            format!(" {} ", board.zoom().label()),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!("│ {lane}brush {brush} │ {sync} │ ")),
        Span::raw("1-3 zoom  e/t/c/d/m brush  ⏎ open  s sync  r reload  q quit"),
    ];
    if !status.is_empty() {
        spans.push(Span::styled(
            format!("  {status}"),
            Style::default().fg(Color::LightYellow),
        ));
    }
    Line::from(spans)
}

/// Side panel text for the selected record.
pub fn detail_lines(board: &Board, detail: &Detail) -> Vec<Line<'static>> {
    let Some(record) = board
        .lane(&detail.lane_id)
        .and_then(|lane| lane.record(&detail.uuid))
    else {
        return vec![Line::raw("record no longer loaded")];
    };
    let dim = Style::default().fg(Color::Gray);
    let mut lines = Vec::new();

    let mut head = vec![Span::styled(
        format!("{:?}", record.role).to_lowercase(),
        Style::default().add_modifier(Modifier::BOLD),
    )];
    if let Some(model) = &record.model {
        head.push(Span::styled(format!(" · {model}"), dim));
    }
    let tokens = record.billed_tokens();
    if tokens > 0 {
        head.push(Span::styled(format!(" · {} tok", format_tokens(tokens)), dim));
    }
    lines.push(Line::from(head));

    if detail.thread.len() > 1 {
        lines.push(Line::styled(
            format!("thread depth {} from {}", detail.thread.len() - 1, detail.thread[0]),
            dim,
        ));
    }

    if let Some(invocation) = &record.tool_invocation {
        let input = ToolInput::resolve(invocation);
        let headline = input.headline().unwrap_or("");
        lines.push(Line::from(vec![
            Span::styled(
                invocation.name.clone(),
                Style::default().fg(Color::LightCyan),
            ),
            Span::raw(format!(" {headline}")),
        ]));
    }
    if let Some(result) = &record.tool_result {
        if result.is_error == Some(true) {
            lines.push(Line::styled("tool error", Style::default().fg(Color::LightRed)));
        }
        if let Some(code) = result.exit_code {
            lines.push(Line::styled(format!("exit {code}"), dim));
        }
        if let Some(stderr) = &result.stderr {
            for line in stderr.lines() {
                lines.push(Line::styled(line.to_string(), Style::default().fg(Color::LightRed)));
            }
        }
    }

    lines.push(Line::raw(""));
    lines.extend(record.text().lines().map(|l| Line::raw(l.to_string())));
    lines
}
