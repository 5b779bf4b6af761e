//! One session rendered as a vertically scrolling column.

use std::sync::Arc;

use lanewise_protocol::SharedStr;
use serde::Serialize;
use tracing::debug;

use crate::brush::ActiveBrush;
use crate::classify::{ClassificationCache, SemanticTags};
use crate::config::{BoardConfig, RowSizes};
use crate::model::{InteractionRecord, LaneData, LaneStats, Role, ZoomLevel, thread_of};
use crate::sync::Scrollable;
use crate::window::{SizeModel, ViewportWindow, Windower};

/// Upper bound on records folded into one merged card.
const MAX_MERGE: usize = 50;

/// Where the top of the viewport sits, independent of item sizes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScrollAnchor {
    /// Topmost visible record (index into the visible subset).
    pub index: usize,
    /// How far into that record the viewport starts, `0.0..1.0`.
    pub fraction: f64,
}

/// One visual unit of a lane: a single record, or at pixel/skim zoom a run
/// of consecutive tool calls from the same agent.
#[derive(Debug, Clone, Serialize)]
pub struct CardView {
    /// First and last covered record, as visible-subset indices.
    pub first: usize,
    pub last: usize,
    pub uuid: SharedStr,
    pub role: Role,
    pub tags: Arc<SemanticTags>,
    pub matched: bool,
    /// Brush active and no covered record matched.
    pub dimmed: bool,
    pub has_error: bool,
    /// Lane-space offset and extent along the scroll axis.
    pub offset: f64,
    pub extent: f64,
    pub summary: String,
    pub tokens: u64,
    pub message_count: usize,
    pub timestamp_ms: Option<i64>,
    pub model: Option<String>,
}

impl CardView {
    pub fn merged(&self) -> bool {
        self.message_count > 1
    }
}

pub struct Lane {
    data: LaneData,
    version: u64,
    /// Indices into `data.records` of the visible subset.
    visible: Vec<usize>,
    stats: LaneStats,
    zoom: ZoomLevel,
    row_sizes: RowSizes,
    sizes: SizeModel,
    windower: Windower,
    window: ViewportWindow,
    container_extent: f64,
    /// Anchor a zoom change could not honour because of clamping; reused
    /// by the next zoom change unless the lane is scrolled in between.
    zoom_anchor: Option<ScrollAnchor>,
    summary_chars: usize,
    cache: ClassificationCache,
}

impl Lane {
    pub fn new(data: LaneData, config: &BoardConfig, zoom: ZoomLevel) -> Self {
        let mut lane = Self {
            data,
            version: 1,
            visible: Vec::new(),
            stats: LaneStats::default(),
            zoom,
            row_sizes: config.row_size,
            sizes: SizeModel::uniform(0, 1.0),
            windower: Windower::new(config.overscan),
            window: ViewportWindow::default(),
            container_extent: 0.0,
            zoom_anchor: None,
            summary_chars: config.summary_chars,
            cache: ClassificationCache::new(),
        };
        lane.rebuild();
        lane
    }

    pub fn id(&self) -> &SharedStr {
        self.data.id()
    }

    pub fn title(&self) -> &str {
        &self.data.session.title
    }

    pub fn data(&self) -> &LaneData {
        &self.data
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn stats(&self) -> LaneStats {
        self.stats
    }

    pub fn window(&self) -> &ViewportWindow {
        &self.window
    }

    pub fn zoom(&self) -> ZoomLevel {
        self.zoom
    }

    pub fn visible_len(&self) -> usize {
        self.visible.len()
    }

    pub fn cache_stats(&self) -> crate::classify::CacheStats {
        self.cache.stats()
    }

    /// The visible subset, in record order.
    pub fn visible_records(&self) -> impl Iterator<Item = &InteractionRecord> {
        self.visible.iter().map(|&i| &self.data.records[i])
    }

    /// Replace the snapshot. Returns `false` when it is the one already
    /// held.
    pub fn set_snapshot(&mut self, data: LaneData) -> bool {
        if data.same_snapshot(&self.data) && data.commits == self.data.commits {
            return false;
        }
        self.data = data;
        self.version += 1;
        self.zoom_anchor = None;
        self.rebuild();
        true
    }

    fn rebuild(&mut self) {
        self.visible = self.data.visible_indices();
        self.recompute_stats();
        self.rebuild_sizes();
        self.refresh_window(self.window.scroll_offset);
        debug!(
            lane = %self.data.session.id,
            version = self.version,
            records = self.stats.record_count,
            visible = self.stats.visible_count,
            "lane snapshot rebuilt"
        );
    }

    fn recompute_stats(&mut self) {
        let records = &self.data.records;
        let mut stats = LaneStats {
            record_count: records.len(),
            visible_count: self.visible.len(),
            ..LaneStats::default()
        };
        for record in records.iter() {
            stats.total_tokens = stats.total_tokens.saturating_add(record.billed_tokens());
            let tags = self
                .cache
                .tags(self.version, record, records, &self.data.commits);
            if tags.is_error {
                stats.error_count += 1;
            }
        }
        self.stats = stats;
    }

    fn rebuild_sizes(&mut self) {
        self.sizes = match self.zoom {
            ZoomLevel::Detail => {
                let rs = self.row_sizes;
                SizeModel::variable(
                    self.visible
                        .iter()
                        .map(|&i| detail_extent(&rs, &self.data.records[i])),
                )
            }
            zoom => SizeModel::uniform(self.visible.len(), self.row_sizes.base(zoom)),
        };
    }

    fn refresh_window(&mut self, offset: f64) {
        self.window = self
            .windower
            .compute(&self.sizes, offset, self.container_extent);
    }

    pub fn resize(&mut self, container_extent: f64) {
        self.container_extent = container_extent;
        self.refresh_window(self.window.scroll_offset);
    }

    pub fn anchor(&self) -> ScrollAnchor {
        let offset = self.window.scroll_offset;
        let index = self.sizes.index_at(offset).unwrap_or(0);
        let size = self.sizes.size_of(index);
        let fraction = if size > 0.0 {
            ((offset - self.sizes.offset_of(index)) / size).clamp(0.0, 1.0)
        } else {
            0.0
        };
        ScrollAnchor { index, fraction }
    }

    /// Scroll so `anchor` is at the top again under the current sizes.
    /// Returns `false` when clamping prevented it.
    pub fn reanchor(&mut self, anchor: ScrollAnchor) -> bool {
        let index = anchor.index.min(self.visible.len().saturating_sub(1));
        let wanted = self.sizes.offset_of(index) + anchor.fraction * self.sizes.size_of(index);
        self.refresh_window(wanted);
        (self.window.scroll_offset - wanted).abs() <= f64::EPSILON
    }

    /// Switch item sizes to `zoom`, keeping the same record at the top.
    pub fn set_zoom(&mut self, zoom: ZoomLevel) {
        if zoom == self.zoom {
            return;
        }
        let anchor = self.zoom_anchor.take().unwrap_or_else(|| self.anchor());
        self.zoom = zoom;
        self.rebuild_sizes();
        if !self.reanchor(anchor) {
            self.zoom_anchor = Some(anchor);
        }
    }

    /// Visible-subset position of a record.
    pub fn position_of(&self, uuid: &str) -> Option<usize> {
        self.visible
            .iter()
            .position(|&i| self.data.records[i].uuid == uuid)
    }

    pub fn record(&self, uuid: &str) -> Option<&InteractionRecord> {
        self.data.records.iter().find(|r| r.uuid == uuid)
    }

    pub fn tags_for(&mut self, uuid: &str) -> Option<Arc<SemanticTags>> {
        let record = self.data.records.iter().find(|r| r.uuid == uuid)?;
        Some(
            self.cache
                .tags(self.version, record, &self.data.records, &self.data.commits),
        )
    }

    /// Ancestor chain of a record, root first.
    pub fn thread_of(&self, uuid: &str) -> Vec<SharedStr> {
        thread_of(&self.data.records, uuid)
    }

    /// Lane-space rect (offset, extent) of a record at the current zoom.
    pub fn extent_of(&self, position: usize) -> (f64, f64) {
        (self.sizes.offset_of(position), self.sizes.size_of(position))
    }

    /// Cards for the render range of the current window.
    pub fn cards(&mut self, brush: Option<&ActiveBrush>) -> Vec<CardView> {
        let range = self.window.render_range();
        if range.is_empty() {
            return Vec::new();
        }
        let merge = self.zoom.merges_siblings();

        // Start at the head of a run crossing the top edge so merged cards
        // do not change shape while scrolling.
        let mut start = range.start;
        if merge {
            let floor = range.start.saturating_sub(MAX_MERGE);
            while start > floor && self.mergeable(start - 1, start) {
                start -= 1;
            }
        }

        let mut cards = Vec::with_capacity(range.len());
        let mut first = start;
        while first < range.end {
            let mut last = first;
            if merge {
                while last + 1 < self.visible.len()
                    && last + 1 - first < MAX_MERGE
                    && self.mergeable(last, last + 1)
                {
                    last += 1;
                }
            }
            cards.push(self.card(first, last, brush));
            first = last + 1;
        }
        cards
    }

    fn mergeable(&self, a: usize, b: usize) -> bool {
        let ra = &self.data.records[self.visible[a]];
        let rb = &self.data.records[self.visible[b]];
        ra.tool_invocation.is_some() && rb.tool_invocation.is_some() && ra.agent_id == rb.agent_id
    }

    fn card(&mut self, first: usize, last: usize, brush: Option<&ActiveBrush>) -> CardView {
        let records = &self.data.records;
        let head = &records[self.visible[first]];
        let head_tags = self
            .cache
            .tags(self.version, head, records, &self.data.commits);

        let mut matched = false;
        let mut has_error = false;
        let mut tokens = 0u64;
        for &ri in &self.visible[first..=last] {
            let record = &records[ri];
            let tags = self
                .cache
                .tags(self.version, record, records, &self.data.commits);
            matched |= self.cache.matched(self.version, brush, record, &tags);
            has_error |= tags.any_error();
            tokens = tokens.saturating_add(record.billed_tokens());
        }

        let offset = self.sizes.offset_of(first);
        let extent = self.sizes.offset_of(last + 1) - offset;
        CardView {
            first,
            last,
            uuid: head.uuid.clone(),
            role: head.role,
            summary: summarize(head, &head_tags, self.summary_chars),
            tags: head_tags,
            matched,
            dimmed: brush.is_some() && !matched,
            has_error,
            offset,
            extent,
            tokens,
            message_count: last - first + 1,
            timestamp_ms: head.timestamp_ms,
            model: head.model.clone(),
        }
    }
}

impl Scrollable for Lane {
    fn scroll_offset(&self) -> f64 {
        self.window.scroll_offset
    }

    fn set_scroll_offset(&mut self, offset: f64) {
        self.zoom_anchor = None;
        self.refresh_window(offset);
    }
}

fn detail_extent(rs: &RowSizes, record: &InteractionRecord) -> f64 {
    let extra_lines = record
        .text()
        .lines()
        .filter(|l| !l.trim().is_empty())
        .count()
        .saturating_sub(1)
        .min(rs.detail_max_lines);
    rs.detail + extra_lines as f64 * rs.detail_line
}

/// One-line description of a record: `tool: argument` for tool calls, the
/// first non-empty text line otherwise.
pub fn summarize(record: &InteractionRecord, tags: &SemanticTags, max_chars: usize) -> String {
    let line = match (record.tool_name(), tags.tool.as_ref().and_then(|t| t.headline())) {
        (Some(name), Some(arg)) => format!("{name}: {}", first_line(arg)),
        (Some(name), None) => name.to_string(),
        (None, _) => first_line(record.text()).to_string(),
    };
    truncate(&line, max_chars)
}

fn first_line(text: &str) -> &str {
    text.lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or("")
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    out.push('…');
    out
}
