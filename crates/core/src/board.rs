//! The multi-lane comparison board.
//!
//! Owns the board-wide state (zoom level, active brush, visible lane order,
//! column window) and composes one [`Lane`] per session. Input arrives as
//! method calls from a host; output is render commands plus a queue of
//! [`BoardEvent`]s the host drains after each interaction.

use std::collections::{HashMap, HashSet, VecDeque};
use std::ops::RangeInclusive;

use lanewise_protocol::{HitTarget, Point, Rect, RenderCommand, SharedStr, ThemeToken, Viewport};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error, info};

use crate::brush::{ActiveBrush, BrushKind, candidate_value};
use crate::config::BoardConfig;
use crate::lane::Lane;
use crate::model::{LaneData, ZoomLevel};
use crate::sync::{ScrollSync, Scrollable, SyncOutcome, SyncStats};
use crate::views::{self, CardStyle};
use crate::window::{SizeModel, ViewportWindow, Windower, clamp_scroll};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum BoardError {
    #[error("viewport {width}x{height} is not drawable")]
    InvalidViewport { width: f64, height: f64 },
    #[error("unknown lane `{0}`")]
    UnknownLane(SharedStr),
    #[error("lane `{lane}` has no record `{uuid}`")]
    UnknownRecord { lane: SharedStr, uuid: SharedStr },
}

/// Notifications for the host, in the order they happened.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum BoardEvent {
    /// Open the detail view for `uuid`. `anchor` is the card's last known
    /// screen rect, `thread` its ancestor chain, root first.
    #[serde(rename_all = "camelCase")]
    InteractionSelected {
        uuid: SharedStr,
        lane_id: SharedStr,
        anchor: Option<Rect>,
        thread: Vec<SharedStr>,
    },
    SelectionCleared,
    BrushChanged { brush: Option<ActiveBrush> },
    ZoomChanged { zoom: ZoomLevel },
    RenderFailed { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardRef {
    pub lane_id: SharedStr,
    pub uuid: SharedStr,
}

/// Screen rects of the cards drawn by the last pass, per lane.
type CardRects = HashMap<SharedStr, Vec<(RangeInclusive<usize>, Rect)>>;

pub struct Board {
    config: BoardConfig,
    lanes: Vec<Lane>,
    visible: Vec<SharedStr>,
    zoom: ZoomLevel,
    brush: Option<ActiveBrush>,
    viewport: Viewport,
    windower: Windower,
    columns: ViewportWindow,
    sync: ScrollSync,
    selected: Option<CardRef>,
    hovered: Option<CardRef>,
    card_rects: CardRects,
    hit_regions: Vec<(Rect, HitTarget)>,
    failure: Option<String>,
    events: VecDeque<BoardEvent>,
}

impl Board {
    pub fn new(config: BoardConfig) -> Self {
        Self {
            zoom: config.initial_zoom,
            sync: ScrollSync::new(config.sync_scroll),
            windower: Windower::new(config.overscan),
            config,
            lanes: Vec::new(),
            visible: Vec::new(),
            brush: None,
            viewport: Viewport::new(0.0, 0.0),
            columns: ViewportWindow::default(),
            selected: None,
            hovered: None,
            card_rects: HashMap::new(),
            hit_regions: Vec::new(),
            failure: None,
            events: VecDeque::new(),
        }
    }

    pub fn config(&self) -> &BoardConfig {
        &self.config
    }

    pub fn zoom(&self) -> ZoomLevel {
        self.zoom
    }

    pub fn brush(&self) -> Option<&ActiveBrush> {
        self.brush.as_ref()
    }

    pub fn selected(&self) -> Option<&CardRef> {
        self.selected.as_ref()
    }

    pub fn hovered(&self) -> Option<&CardRef> {
        self.hovered.as_ref()
    }

    pub fn visible_lanes(&self) -> &[SharedStr] {
        &self.visible
    }

    pub fn lanes(&self) -> &[Lane] {
        &self.lanes
    }

    pub fn lane(&self, id: &str) -> Option<&Lane> {
        self.lanes.iter().find(|l| l.id() == id)
    }

    pub fn columns(&self) -> &ViewportWindow {
        &self.columns
    }

    pub fn sync_stats(&self) -> SyncStats {
        self.sync.stats()
    }

    pub fn is_failed(&self) -> bool {
        self.failure.is_some()
    }

    pub fn set_sync_enabled(&mut self, enabled: bool) {
        self.config.sync_scroll = enabled;
        self.sync.set_enabled(enabled);
    }

    /// Lane column under a board-space point, ignoring the gaps.
    pub fn lane_at(&self, point: Point) -> Option<&SharedStr> {
        let pitch = self.config.column_pitch();
        let rel = point.x - self.viewport.x + self.columns.scroll_offset;
        if rel < 0.0 || pitch <= 0.0 {
            return None;
        }
        let col = (rel / pitch).floor();
        if rel - col * pitch >= self.config.lane_width {
            return None;
        }
        self.visible.get(col as usize)
    }

    fn lane_index(&self, id: &str) -> Option<usize> {
        self.lanes.iter().position(|l| l.id() == id)
    }

    fn body_extent(&self) -> f64 {
        (self.viewport.height - self.config.header_height).max(0.0)
    }

    /// Replace the session set. Known lanes get the new snapshot, new ones
    /// are appended to the visible order, vanished ones are dropped.
    pub fn set_sessions(&mut self, sessions: Vec<LaneData>) {
        let shared_offset = self
            .config
            .sync_scroll
            .then(|| self.lanes.first().map(Lane::scroll_offset))
            .flatten();
        let mut previous: Vec<Lane> = std::mem::take(&mut self.lanes);
        let mut added = 0usize;

        for data in sessions {
            if self.lanes.iter().any(|l| l.id() == data.id()) {
                debug!(lane = %data.id(), "duplicate session ignored");
                continue;
            }
            let lane = match previous.iter().position(|l| l.id() == data.id()) {
                Some(i) => {
                    let mut lane = previous.swap_remove(i);
                    lane.set_snapshot(data);
                    lane
                }
                None => {
                    let mut lane = Lane::new(data, &self.config, self.zoom);
                    lane.resize(self.body_extent());
                    if let Some(offset) = shared_offset {
                        lane.set_scroll_offset(offset);
                    }
                    if !self.visible.contains(lane.id()) {
                        self.visible.push(lane.id().clone());
                    }
                    added += 1;
                    lane
                }
            };
            self.lanes.push(lane);
        }

        let lanes = &self.lanes;
        self.visible.retain(|id| lanes.iter().any(|l| l.id() == id));
        if let Some(sel) = &self.selected {
            let still_there = self
                .lane(&sel.lane_id)
                .is_some_and(|l| l.record(&sel.uuid).is_some());
            if !still_there {
                self.selected = None;
                self.events.push_back(BoardEvent::SelectionCleared);
            }
        }
        self.hovered = None;
        self.refresh_columns(self.columns.scroll_offset);
        info!(
            lanes = self.lanes.len(),
            added,
            removed = previous.len(),
            "sessions updated"
        );
    }

    /// Set which lanes are shown, in order. Repeats are dropped. Other ids
    /// are kept verbatim; an id with no loaded lane fails the next render
    /// until [`Board::reload`].
    pub fn set_visible_lanes(&mut self, ids: Vec<SharedStr>) {
        let mut seen = HashSet::with_capacity(ids.len());
        self.visible = ids.into_iter().filter(|id| seen.insert(id.clone())).collect();
        self.refresh_columns(self.columns.scroll_offset);
    }

    pub fn set_zoom(&mut self, zoom: ZoomLevel) {
        if zoom == self.zoom {
            return;
        }
        debug!(from = %self.zoom, to = %zoom, "zoom changed");
        self.zoom = zoom;
        for lane in &mut self.lanes {
            lane.set_zoom(zoom);
        }
        self.events.push_back(BoardEvent::ZoomChanged { zoom });
    }

    pub fn cycle_zoom(&mut self) {
        self.set_zoom(self.zoom.next());
    }

    /// Replace or clear the brush.
    pub fn set_brush(&mut self, brush: Option<ActiveBrush>) {
        if brush == self.brush {
            return;
        }
        debug!(brush = ?brush, "brush changed");
        self.brush = brush.clone();
        self.events.push_back(BoardEvent::BrushChanged { brush });
    }

    /// Set `brush`, or clear it if it is already the active one.
    pub fn toggle_brush(&mut self, brush: ActiveBrush) {
        if self.brush.as_ref() == Some(&brush) {
            self.set_brush(None);
        } else {
            self.set_brush(Some(brush));
        }
    }

    /// Hover refinement: only retargets an already active brush.
    pub fn hover_brush_suggest(&mut self, kind: BrushKind, value: impl Into<String>) -> bool {
        if self.brush.is_none() {
            return false;
        }
        let suggestion = ActiveBrush::new(kind, value);
        if self.brush.as_ref() == Some(&suggestion) {
            return false;
        }
        self.set_brush(Some(suggestion));
        true
    }

    /// Track the hovered card and, while a brush is active, offer the
    /// record's value for the brush's dimension.
    pub fn hover_card(&mut self, lane_id: &str, uuid: &str) -> Result<(), BoardError> {
        let li = self
            .lane_index(lane_id)
            .ok_or_else(|| BoardError::UnknownLane(lane_id.into()))?;
        let lane = &mut self.lanes[li];
        let Some(tags) = lane.tags_for(uuid) else {
            return Err(BoardError::UnknownRecord {
                lane: lane_id.into(),
                uuid: uuid.into(),
            });
        };
        self.hovered = Some(CardRef {
            lane_id: lane.id().clone(),
            uuid: uuid.into(),
        });
        let suggestion = match (&self.brush, lane.record(uuid)) {
            (Some(brush), Some(record)) => {
                candidate_value(brush.kind, record, &tags).map(|v| (brush.kind, v))
            }
            _ => None,
        };
        if let Some((kind, value)) = suggestion {
            self.hover_brush_suggest(kind, value);
        }
        Ok(())
    }

    pub fn clear_hover(&mut self) {
        self.hovered = None;
    }

    /// Select a record for the detail view. Selecting the selected record
    /// again clears the selection.
    pub fn select_interaction(&mut self, lane_id: &str, uuid: &str) -> Result<(), BoardError> {
        let lane = self
            .lane(lane_id)
            .ok_or_else(|| BoardError::UnknownLane(lane_id.into()))?;
        if lane.record(uuid).is_none() {
            return Err(BoardError::UnknownRecord {
                lane: lane_id.into(),
                uuid: uuid.into(),
            });
        }
        let target = CardRef {
            lane_id: lane.id().clone(),
            uuid: uuid.into(),
        };
        let thread = lane.thread_of(uuid);
        let anchor = self.card_rect(lane, uuid);
        if self.selected.as_ref() == Some(&target) {
            self.selected = None;
            self.events.push_back(BoardEvent::SelectionCleared);
            return Ok(());
        }
        self.events.push_back(BoardEvent::InteractionSelected {
            uuid: target.uuid.clone(),
            lane_id: target.lane_id.clone(),
            anchor,
            thread,
        });
        self.selected = Some(target);
        Ok(())
    }

    /// Last drawn rect of the card covering `uuid`.
    fn card_rect(&self, lane: &Lane, uuid: &str) -> Option<Rect> {
        let position = lane.position_of(uuid)?;
        self.card_rects
            .get(lane.id())?
            .iter()
            .find(|(range, _)| range.contains(&position))
            .map(|(_, rect)| *rect)
    }

    /// A lane reported a scroll. Propagated to the others when sync is on.
    pub fn on_lane_scroll(&mut self, lane_id: &str, offset: f64) -> Result<SyncOutcome, BoardError> {
        let origin = self
            .lane_index(lane_id)
            .ok_or_else(|| BoardError::UnknownLane(lane_id.into()))?;
        Ok(self.sync.on_scroll(&mut self.lanes, origin, offset))
    }

    pub fn scroll_lane_by(&mut self, lane_id: &str, delta: f64) -> Result<SyncOutcome, BoardError> {
        let current = self
            .lane(lane_id)
            .ok_or_else(|| BoardError::UnknownLane(lane_id.into()))?
            .scroll_offset();
        self.on_lane_scroll(lane_id, current + delta)
    }

    pub fn scroll_columns(&mut self, delta: f64) {
        self.refresh_columns(self.columns.scroll_offset + delta);
    }

    /// Scroll horizontally so the lane at visible position `index` is in
    /// view.
    pub fn reveal_column(&mut self, index: usize) {
        let pitch = self.config.column_pitch();
        let left = index as f64 * pitch;
        let offset = self.columns.scroll_offset;
        if left < offset {
            self.refresh_columns(left);
        } else if left + self.config.lane_width > offset + self.viewport.width {
            self.refresh_columns(left + self.config.lane_width - self.viewport.width);
        }
    }

    fn refresh_columns(&mut self, offset: f64) {
        let sizes = SizeModel::uniform(self.visible.len(), self.config.column_pitch());
        let extent = self.viewport.width;
        self.columns = self
            .windower
            .compute(&sizes, clamp_scroll(offset, sizes.total_extent(), extent), extent);
    }

    pub fn begin_pan(&mut self, pointer: Point, modifier_held: bool) -> bool {
        self.sync.begin_pan(pointer, modifier_held)
    }

    /// Pan both axes. Returns `false` once the gesture is over.
    pub fn pan_move(&mut self, pointer: Point, modifier_held: bool) -> bool {
        match self.sync.pan_move(&mut self.lanes, pointer, modifier_held) {
            Some(delta) => {
                if delta.dx != 0.0 {
                    self.scroll_columns(-delta.dx);
                }
                true
            }
            None => false,
        }
    }

    pub fn end_pan(&mut self) {
        self.sync.end_pan();
    }

    pub fn is_panning(&self) -> bool {
        self.sync.is_panning()
    }

    /// Call once per frame after input is processed.
    pub fn idle_tick(&mut self) {
        self.sync.idle_tick();
    }

    pub fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        let body = self.body_extent();
        for lane in &mut self.lanes {
            lane.resize(body);
        }
        self.refresh_columns(self.columns.scroll_offset);
    }

    pub fn drain_events(&mut self) -> Vec<BoardEvent> {
        self.events.drain(..).collect()
    }

    /// Topmost hit-testable rect under `point` from the last render.
    pub fn hit_test(&self, point: Point) -> Option<&HitTarget> {
        self.hit_regions
            .iter()
            .rev()
            .find(|(rect, _)| rect.contains(point))
            .map(|(_, target)| target)
    }

    /// Pointer click: selects cards, triggers reload.
    pub fn click(&mut self, point: Point) -> Option<HitTarget> {
        let target = self.hit_test(point).cloned()?;
        match &target {
            HitTarget::Card { lane_id, uuid } => {
                if let Err(err) = self.select_interaction(lane_id, uuid) {
                    debug!(%err, "stale hit target");
                }
            }
            HitTarget::Reload => self.reload(),
            HitTarget::LaneHeader { .. } => {}
        }
        Some(target)
    }

    /// Pointer move: updates hover from the last render.
    pub fn hover(&mut self, point: Point) {
        match self.hit_test(point).cloned() {
            Some(HitTarget::Card { lane_id, uuid }) => {
                if let Err(err) = self.hover_card(&lane_id, &uuid) {
                    debug!(%err, "stale hit target");
                }
            }
            _ => self.hovered = None,
        }
    }

    /// Recover from a render failure: drop visible ids with no lane and
    /// reset transient pointer and window state.
    pub fn reload(&mut self) {
        let lanes = &self.lanes;
        let before = self.visible.len();
        self.visible.retain(|id| lanes.iter().any(|l| l.id() == id));
        self.failure = None;
        self.hovered = None;
        self.sync.end_pan();
        self.sync.idle_tick();
        self.card_rects.clear();
        self.hit_regions.clear();
        let viewport = self.viewport;
        self.resize(viewport);
        info!(pruned = before - self.visible.len(), "board reloaded");
    }

    /// Render the board. Failures are contained: a notice with a reload
    /// button replaces the board until [`Board::reload`].
    pub fn render(&mut self, viewport: &Viewport) -> Vec<RenderCommand> {
        if let Some(message) = &self.failure {
            let commands = views::render_failure(viewport, message);
            self.hit_regions = hit_regions(&commands);
            return commands;
        }
        match self.try_render(viewport) {
            Ok(commands) => commands,
            Err(err) => {
                error!(%err, "board render failed");
                let message = err.to_string();
                let commands = views::render_failure(viewport, &message);
                self.hit_regions = hit_regions(&commands);
                self.card_rects.clear();
                self.events.push_back(BoardEvent::RenderFailed {
                    message: message.clone(),
                });
                self.failure = Some(message);
                commands
            }
        }
    }

    pub fn try_render(&mut self, viewport: &Viewport) -> Result<Vec<RenderCommand>, BoardError> {
        if !viewport.is_valid() {
            return Err(BoardError::InvalidViewport {
                width: viewport.width,
                height: viewport.height,
            });
        }
        if *viewport != self.viewport {
            self.resize(*viewport);
        }
        if self.visible.is_empty() {
            let commands = views::render_empty_state(viewport);
            self.hit_regions.clear();
            self.card_rects.clear();
            return Ok(commands);
        }

        // Resolve every visible column before drawing anything.
        let columns = self.columns.render_range();
        let mut resolved = Vec::with_capacity(columns.len());
        for col in columns {
            let id = &self.visible[col];
            let li = self
                .lane_index(id)
                .ok_or_else(|| BoardError::UnknownLane(id.clone()))?;
            resolved.push((col, li));
        }

        let mut commands = Vec::new();
        commands.push(RenderCommand::BeginGroup {
            id: "board".into(),
            label: Some("Session board".into()),
        });
        commands.push(RenderCommand::DrawRect {
            rect: viewport.rect(),
            color: ThemeToken::Background,
            border_color: None,
            label: None,
            target: None,
            dimmed: false,
        });

        let mut card_rects = CardRects::new();
        let header_h = self.config.header_height.min(viewport.height);
        let lane_w = self.config.lane_width;
        let pitch = self.config.column_pitch();
        for (col, li) in resolved {
            let x = viewport.x + col as f64 * pitch - self.columns.scroll_offset;
            let header = Rect::new(x, viewport.y, lane_w, header_h);
            let body = Rect::new(x, viewport.y + header_h, lane_w, viewport.height - header_h);
            let rects = self.render_lane(li, header, body, &mut commands);
            card_rects.insert(self.lanes[li].id().clone(), rects);
        }

        commands.push(RenderCommand::EndGroup);
        self.hit_regions = hit_regions(&commands);
        self.card_rects = card_rects;
        Ok(commands)
    }

    fn render_lane(
        &mut self,
        li: usize,
        header: Rect,
        body: Rect,
        out: &mut Vec<RenderCommand>,
    ) -> Vec<(RangeInclusive<usize>, Rect)> {
        let zoom = self.zoom;
        let brush = self.brush.clone();
        let lane = &mut self.lanes[li];
        let lane_id = lane.id().clone();
        let scroll = lane.scroll_offset();
        let cards = lane.cards(brush.as_ref());

        let position_in = |card_ref: &Option<CardRef>| {
            card_ref
                .as_ref()
                .filter(|r| r.lane_id == lane_id)
                .and_then(|r| lane.position_of(&r.uuid))
        };
        let selected = position_in(&self.selected);
        let hovered = position_in(&self.hovered);

        out.push(RenderCommand::BeginGroup {
            id: lane_id.clone(),
            label: Some(lane.title().into()),
        });
        out.push(RenderCommand::SetClip { rect: body });
        out.push(RenderCommand::DrawRect {
            rect: body,
            color: ThemeToken::LaneBackground,
            border_color: Some(ThemeToken::LaneBorder),
            label: None,
            target: None,
            dimmed: false,
        });

        let inset = (body.w * 0.02).min(4.0);
        let mut rects = Vec::with_capacity(cards.len());
        for card in &cards {
            let gap = (card.extent * 0.1).min(2.0);
            let rect = Rect::new(
                body.x + inset,
                body.y + card.offset - scroll,
                body.w - 2.0 * inset,
                card.extent - gap,
            );
            let covers = |p: Option<usize>| p.is_some_and(|p| (card.first..=card.last).contains(&p));
            let style = CardStyle {
                selected: covers(selected),
                hovered: covers(hovered),
                brush_active: brush.is_some(),
            };
            views::render_card(&lane_id, card, rect, zoom, style, out);
            rects.push((card.first..=card.last, rect));
        }
        out.push(RenderCommand::ClearClip);

        views::render_lane_header(&lane_id, lane.title(), &lane.stats(), header, out);
        out.push(RenderCommand::EndGroup);
        rects
    }
}

fn hit_regions(commands: &[RenderCommand]) -> Vec<(Rect, HitTarget)> {
    commands
        .iter()
        .filter_map(|c| match c {
            RenderCommand::DrawRect {
                rect,
                target: Some(target),
                ..
            } => Some((*rect, target.clone())),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{InteractionRecord, Role, Session};
    use serde_json::json;

    fn lane(id: &str, n: usize) -> LaneData {
        let records = (0..n)
            .map(|i| {
                let r = InteractionRecord::new(format!("{id}-{i}"), Role::Assistant);
                if i % 10 == 5 {
                    r.with_tool("Read", json!({ "file_path": format!("src/{i}.rs") }))
                } else {
                    r.with_text(format!("step {i}"))
                }
            })
            .collect();
        LaneData::new(Session::new(id, format!("Session {id}")), records)
    }

    fn board(ids: &[&str]) -> Board {
        let mut board = Board::new(BoardConfig::default());
        board.set_sessions(ids.iter().map(|id| lane(id, 100)).collect());
        board.resize(Viewport::new(800.0, 600.0));
        board
    }

    fn offset(board: &Board, id: &str) -> f64 {
        board.lane(id).map(Lane::scroll_offset).unwrap_or(f64::NAN)
    }

    fn reload_point(commands: &[RenderCommand]) -> Option<Point> {
        commands.iter().find_map(|c| match c {
            RenderCommand::DrawRect {
                rect,
                target: Some(HitTarget::Reload),
                ..
            } => Some(Point::new(rect.x + rect.w / 2.0, rect.y + rect.h / 2.0)),
            _ => None,
        })
    }

    #[test]
    fn no_lanes_renders_empty_state() {
        let mut board = Board::new(BoardConfig::default());
        let cmds = board.render(&Viewport::new(800.0, 600.0));
        assert!(cmds.iter().any(|c| matches!(
            c,
            RenderCommand::DrawText { text, .. } if text.as_str() == views::EMPTY_MESSAGE
        )));
        assert!(board.hit_test(Point::new(400.0, 300.0)).is_none());
        assert!(board.drain_events().is_empty());
    }

    #[test]
    fn zero_record_lane_keeps_its_shell() {
        let mut board = Board::new(BoardConfig::default());
        board.set_sessions(vec![LaneData::new(Session::new("empty", "Empty"), Vec::new())]);
        let cmds = board.render(&Viewport::new(800.0, 600.0));
        assert!(cmds.iter().any(|c| matches!(
            c,
            RenderCommand::DrawText { text, .. } if text.as_str() == "0 tok · 0 err · 0 msgs"
        )));
        assert!(!cmds.iter().any(|c| matches!(c.target(), Some(HitTarget::Card { .. }))));
        assert!(!board.is_failed());
    }

    #[test]
    fn hit_test_prefers_headers_over_cards() {
        let mut board = board(&["a", "b"]);
        board.render(&Viewport::new(800.0, 600.0));
        assert_eq!(
            board.hit_test(Point::new(10.0, 10.0)),
            Some(&HitTarget::LaneHeader { lane_id: "a".into() })
        );
        assert_eq!(
            board.hit_test(Point::new(340.0, 50.0)),
            Some(&HitTarget::Card {
                lane_id: "b".into(),
                uuid: "b-0".into()
            })
        );
        // lane gap
        assert!(board.hit_test(Point::new(325.0, 300.0)).is_none());
    }

    #[test]
    fn lane_at_skips_gaps() {
        let mut board = board(&["a", "b"]);
        assert_eq!(board.lane_at(Point::new(10.0, 300.0)).map(SharedStr::as_str), Some("a"));
        assert_eq!(board.lane_at(Point::new(325.0, 300.0)), None);
        assert_eq!(board.lane_at(Point::new(340.0, 300.0)).map(SharedStr::as_str), Some("b"));
        assert_eq!(board.lane_at(Point::new(700.0, 300.0)), None);
        board.set_sync_enabled(false);
        assert!(!board.config().sync_scroll);
    }

    #[test]
    fn selecting_twice_toggles_off() {
        let mut board = board(&["a"]);
        board.render(&Viewport::new(800.0, 600.0));
        assert!(board.click(Point::new(10.0, 50.0)).is_some());
        let events = board.drain_events();
        assert_eq!(
            events,
            vec![BoardEvent::InteractionSelected {
                uuid: "a-0".into(),
                lane_id: "a".into(),
                anchor: Some(Rect::new(4.0, 48.0, 312.0, 26.0)),
                thread: vec!["a-0".into()],
            }]
        );
        board.click(Point::new(10.0, 50.0));
        assert_eq!(board.drain_events(), vec![BoardEvent::SelectionCleared]);
        assert!(board.selected().is_none());
    }

    #[test]
    fn selecting_unknown_record_is_an_error() {
        let mut board = board(&["a"]);
        assert_eq!(
            board.select_interaction("a", "zzz"),
            Err(BoardError::UnknownRecord {
                lane: "a".into(),
                uuid: "zzz".into()
            })
        );
        assert_eq!(
            board.select_interaction("nope", "a-0"),
            Err(BoardError::UnknownLane("nope".into()))
        );
    }

    #[test]
    fn brush_replace_toggle_and_hover_refinement() {
        let mut board = board(&["a"]);
        assert!(!board.hover_brush_suggest(BrushKind::Tool, "Read"));
        assert!(board.brush().is_none());

        // hovering without a brush never starts one
        board.hover_card("a", "a-5").unwrap();
        assert!(board.brush().is_none());

        board.toggle_brush(ActiveBrush::new(BrushKind::Tool, "Bash"));
        board.hover_card("a", "a-5").unwrap();
        assert_eq!(board.brush(), Some(&ActiveBrush::new(BrushKind::Tool, "Read")));

        // a record without a tool offers nothing; the brush stays
        board.hover_card("a", "a-0").unwrap();
        assert_eq!(board.brush(), Some(&ActiveBrush::new(BrushKind::Tool, "Read")));

        board.toggle_brush(ActiveBrush::new(BrushKind::Tool, "Read"));
        assert!(board.brush().is_none());

        let changes: Vec<Option<ActiveBrush>> = board
            .drain_events()
            .into_iter()
            .filter_map(|e| match e {
                BoardEvent::BrushChanged { brush } => Some(brush),
                _ => None,
            })
            .collect();
        assert_eq!(
            changes,
            vec![
                Some(ActiveBrush::new(BrushKind::Tool, "Bash")),
                Some(ActiveBrush::new(BrushKind::Tool, "Read")),
                None
            ]
        );
    }

    #[test]
    fn brushed_render_dims_but_keeps_layout() {
        let mut board = board(&["a"]);
        let vp = Viewport::new(800.0, 600.0);
        let plain = board.render(&vp);
        board.set_brush(Some(ActiveBrush::any_tool()));
        let brushed = board.render(&vp);
        let rects = |cmds: &[RenderCommand]| -> Vec<(Rect, bool)> {
            cmds.iter()
                .filter_map(|c| match c {
                    RenderCommand::DrawRect {
                        rect,
                        target: Some(HitTarget::Card { .. }),
                        dimmed,
                        ..
                    } => Some((*rect, *dimmed)),
                    _ => None,
                })
                .collect()
        };
        let before = rects(&plain);
        let after = rects(&brushed);
        assert_eq!(before.len(), after.len());
        assert!(before.iter().zip(&after).all(|(b, a)| b.0 == a.0));
        assert!(after.iter().any(|(_, dimmed)| *dimmed));
        assert!(after.iter().any(|(_, dimmed)| !*dimmed));
    }

    #[test]
    fn lane_scroll_is_broadcast_once_per_tick() {
        let mut board = board(&["a", "b", "c"]);
        let outcome = board.on_lane_scroll("a", 500.0);
        assert_eq!(
            outcome,
            Ok(SyncOutcome::Broadcast {
                origin: 0,
                offset: 500.0,
                updated: 2
            })
        );
        assert_eq!(offset(&board, "b"), 500.0);
        assert_eq!(offset(&board, "c"), 500.0);

        // echo from the propagation itself
        assert_eq!(board.on_lane_scroll("b", 900.0), Ok(SyncOutcome::Suppressed));
        assert_eq!(offset(&board, "b"), 500.0);

        board.idle_tick();
        board.on_lane_scroll("b", 900.0).unwrap();
        assert_eq!(offset(&board, "a"), 900.0);
        assert_eq!(board.sync_stats().releases, 2);
    }

    #[test]
    fn sync_off_scrolls_one_lane() {
        let mut board = Board::new(BoardConfig {
            sync_scroll: false,
            ..BoardConfig::default()
        });
        board.set_sessions(vec![lane("a", 100), lane("b", 100)]);
        board.resize(Viewport::new(800.0, 600.0));
        board.scroll_lane_by("a", 280.0).unwrap();
        assert_eq!(offset(&board, "a"), 280.0);
        assert_eq!(offset(&board, "b"), 0.0);
    }

    #[test]
    fn pan_moves_both_axes() {
        let mut board = board(&["a", "b", "c"]);
        assert!(!board.begin_pan(Point::new(100.0, 100.0), false));
        assert!(board.begin_pan(Point::new(100.0, 100.0), true));
        assert!(board.pan_move(Point::new(60.0, 50.0), true));
        assert_eq!(board.columns().scroll_offset, 40.0);
        assert_eq!(offset(&board, "a"), 50.0);
        assert_eq!(offset(&board, "c"), 50.0);

        // releasing the modifier ends the gesture
        assert!(!board.pan_move(Point::new(0.0, 0.0), false));
        assert!(!board.is_panning());
        assert_eq!(offset(&board, "a"), 50.0);
    }

    #[test]
    fn zoom_change_reanchors_every_lane() {
        let mut board = board(&["a", "b"]);
        board.on_lane_scroll("a", 28.0 * 40.0).unwrap();
        board.set_zoom(ZoomLevel::Detail);
        board.set_zoom(ZoomLevel::Skim);
        for id in ["a", "b"] {
            let top = board.lane(id).map(|l| l.anchor().index);
            assert_eq!(top, Some(40));
        }
        assert_eq!(
            board.drain_events(),
            vec![
                BoardEvent::ZoomChanged { zoom: ZoomLevel::Detail },
                BoardEvent::ZoomChanged { zoom: ZoomLevel::Skim },
            ]
        );
        board.cycle_zoom();
        assert_eq!(board.zoom(), ZoomLevel::Detail);
    }

    #[test]
    fn session_refresh_keeps_board_state() {
        let mut board = board(&["a", "b"]);
        board.set_zoom(ZoomLevel::Pixel);
        board.set_brush(Some(ActiveBrush::errors()));
        board.select_interaction("a", "a-1").unwrap();
        board.drain_events();

        board.set_sessions(vec![lane("b", 10), lane("c", 10)]);
        let expected: Vec<SharedStr> = vec!["b".into(), "c".into()];
        assert_eq!(board.visible_lanes(), expected.as_slice());
        assert_eq!(board.zoom(), ZoomLevel::Pixel);
        assert_eq!(board.lane("c").map(Lane::zoom), Some(ZoomLevel::Pixel));
        assert_eq!(board.brush(), Some(&ActiveBrush::errors()));
        assert_eq!(board.lane("b").map(Lane::version), Some(2));
        assert_eq!(board.drain_events(), vec![BoardEvent::SelectionCleared]);
    }

    #[test]
    fn restored_lane_order_survives_first_load() {
        let mut board = Board::new(BoardConfig::default());
        board.set_visible_lanes(vec!["b".into(), "a".into(), "b".into()]);
        let expected: Vec<SharedStr> = vec!["b".into(), "a".into()];
        assert_eq!(board.visible_lanes(), expected.as_slice());

        board.set_sessions(vec![lane("a", 10), lane("b", 10)]);
        board.resize(Viewport::new(800.0, 600.0));
        assert_eq!(board.visible_lanes(), expected.as_slice());
        let pitch = board.config().column_pitch();
        assert_eq!(board.columns().total_extent, 2.0 * pitch);
        let second = Point::new(pitch + 1.0, 300.0);
        assert_eq!(board.lane_at(second).map(SharedStr::as_str), Some("a"));

        board.set_sessions(vec![lane("a", 10), lane("b", 10), lane("c", 10)]);
        let expected: Vec<SharedStr> = vec!["b".into(), "a".into(), "c".into()];
        assert_eq!(board.visible_lanes(), expected.as_slice());
    }

    #[test]
    fn unknown_visible_lane_fails_locally_and_reloads() {
        let mut board = board(&["a"]);
        let vp = Viewport::new(800.0, 600.0);
        board.set_visible_lanes(vec!["a".into(), "ghost".into()]);
        let cmds = board.render(&vp);
        assert!(board.is_failed());
        assert_eq!(
            board.drain_events(),
            vec![BoardEvent::RenderFailed {
                message: "unknown lane `ghost`".into()
            }]
        );

        // still failed on the next frame, without a second event
        let cmds_again = board.render(&vp);
        assert!(board.drain_events().is_empty());
        assert_eq!(reload_point(&cmds), reload_point(&cmds_again));

        let button = reload_point(&cmds).unwrap();
        assert_eq!(board.click(button), Some(HitTarget::Reload));
        assert!(!board.is_failed());
        let expected: Vec<SharedStr> = vec!["a".into()];
        assert_eq!(board.visible_lanes(), expected.as_slice());
        let cmds = board.render(&vp);
        assert!(reload_point(&cmds).is_none());
        assert!(cmds.iter().any(|c| matches!(c.target(), Some(HitTarget::Card { .. }))));
    }

    #[test]
    fn invalid_viewport_is_contained() {
        let mut board = board(&["a"]);
        let bad = Viewport::new(f64::NAN, 600.0);
        let cmds = board.render(&bad);
        assert!(board.is_failed());
        assert!(cmds.iter().all(|c| !matches!(c.target(), Some(HitTarget::Card { .. }))));
        board.reload();
        let cmds = board.render(&Viewport::new(800.0, 600.0));
        assert!(cmds.iter().any(|c| matches!(c.target(), Some(HitTarget::Card { .. }))));
    }
}
