//! Virtualization of long sequences along one axis.
//!
//! A [`SizeModel`] answers "where does item `i` start" and "which item
//! covers offset `y`"; [`Windower::compute`] turns a scroll offset and a
//! container extent into the index range that has to be rendered.

use serde::{Deserialize, Serialize};

/// Item extents along one axis.
#[derive(Debug, Clone, PartialEq)]
pub enum SizeModel {
    /// `count` items of identical `size`.
    Uniform { count: usize, size: f64 },
    /// Per-item sizes stored as prefix sums: `prefix[i]` is the offset of
    /// item `i`, `prefix[len]` the total extent.
    Variable { prefix: Vec<f64> },
}

impl SizeModel {
    /// Non-positive or non-finite sizes are replaced by `1.0` so offsets
    /// stay strictly increasing.
    pub fn uniform(count: usize, size: f64) -> Self {
        let size = if size.is_finite() && size > 0.0 {
            size
        } else {
            1.0
        };
        Self::Uniform { count, size }
    }

    /// Negative or non-finite sizes count as zero.
    pub fn variable(sizes: impl IntoIterator<Item = f64>) -> Self {
        let mut prefix = vec![0.0];
        let mut acc = 0.0;
        for size in sizes {
            if size.is_finite() && size > 0.0 {
                acc += size;
            }
            prefix.push(acc);
        }
        Self::Variable { prefix }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Uniform { count, .. } => *count,
            Self::Variable { prefix } => prefix.len().saturating_sub(1),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn total_extent(&self) -> f64 {
        self.offset_of(self.len())
    }

    /// Start offset of item `index`; `offset_of(len)` is the total extent.
    pub fn offset_of(&self, index: usize) -> f64 {
        let index = index.min(self.len());
        match self {
            Self::Uniform { size, .. } => index as f64 * size,
            Self::Variable { prefix } => prefix.get(index).copied().unwrap_or(0.0),
        }
    }

    pub fn size_of(&self, index: usize) -> f64 {
        if index >= self.len() {
            return 0.0;
        }
        self.offset_of(index + 1) - self.offset_of(index)
    }

    /// Largest index whose start offset is `<= offset`, clamped to the last
    /// item. `None` for an empty model.
    pub fn index_at(&self, offset: f64) -> Option<usize> {
        let len = self.len();
        if len == 0 {
            return None;
        }
        let offset = if offset.is_finite() { offset.max(0.0) } else { 0.0 };
        let index = match self {
            Self::Uniform { size, .. } => (offset / size).floor() as usize,
            Self::Variable { prefix } => prefix[..len]
                .partition_point(|&start| start <= offset)
                .saturating_sub(1),
        };
        Some(index.min(len - 1))
    }

    /// Number of items starting strictly before `offset`.
    fn count_starting_before(&self, offset: f64) -> usize {
        let len = self.len();
        match self {
            Self::Uniform { size, .. } => ((offset / size).ceil().max(0.0) as usize).min(len),
            Self::Variable { prefix } => prefix[..len].partition_point(|&start| start < offset),
        }
    }
}

/// The rendered slice of a sequence. Transient: recomputed on every
/// scroll, resize and zoom change.
///
/// `visible_*` is the range that intersects the container; `render_*`
/// widens it by the overscan margin. Both ends are exclusive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewportWindow {
    pub scroll_offset: f64,
    pub container_extent: f64,
    pub visible_start: usize,
    pub visible_end: usize,
    pub render_start: usize,
    pub render_end: usize,
    pub total_extent: f64,
}

impl ViewportWindow {
    pub fn render_range(&self) -> std::ops::Range<usize> {
        self.render_start..self.render_end
    }

    pub fn visible_range(&self) -> std::ops::Range<usize> {
        self.visible_start..self.visible_end
    }

    pub fn is_empty(&self) -> bool {
        self.visible_start == self.visible_end
    }

    pub fn max_scroll(&self) -> f64 {
        (self.total_extent - self.container_extent).max(0.0)
    }
}

pub const DEFAULT_OVERSCAN: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Windower {
    /// Extra items rendered past each visible edge.
    pub overscan: usize,
}

impl Default for Windower {
    fn default() -> Self {
        Self {
            overscan: DEFAULT_OVERSCAN,
        }
    }
}

/// Clamp a requested offset into `[0, total - container]`.
pub fn clamp_scroll(offset: f64, total_extent: f64, container_extent: f64) -> f64 {
    let max = (total_extent - container_extent.max(0.0)).max(0.0);
    if offset.is_finite() {
        offset.clamp(0.0, max)
    } else {
        0.0
    }
}

impl Windower {
    pub fn new(overscan: usize) -> Self {
        Self { overscan }
    }

    pub fn compute(&self, sizes: &SizeModel, scroll_offset: f64, container_extent: f64) -> ViewportWindow {
        let container_extent = if container_extent.is_finite() {
            container_extent.max(0.0)
        } else {
            0.0
        };
        let total_extent = sizes.total_extent();
        let scroll_offset = clamp_scroll(scroll_offset, total_extent, container_extent);
        let len = sizes.len();

        let Some(start) = sizes.index_at(scroll_offset) else {
            return ViewportWindow {
                scroll_offset,
                container_extent,
                total_extent,
                ..ViewportWindow::default()
            };
        };
        let end = sizes
            .count_starting_before(scroll_offset + container_extent)
            .max(start + 1)
            .min(len);

        ViewportWindow {
            scroll_offset,
            container_extent,
            visible_start: start,
            visible_end: end,
            render_start: start.saturating_sub(self.overscan),
            render_end: end.saturating_add(self.overscan).min(len),
            total_extent,
        }
    }
}
