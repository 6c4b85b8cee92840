// src/grid/virtualizer.rs
//! Visible-window arithmetic for a vertically scrolling grid.
//!
//! Rows have a uniform estimated height unless individual rows report a
//! measured height. `row_top` is the estimate plus the deltas of the measured
//! rows above it, so a lookup costs O(measured rows) and is O(1) when none are
//! measured. The window is found by binary search over `row_top`.

use serde::Serialize;
use std::collections::BTreeMap;

/// Half-open `[start, end)` range of row indices realized in the view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub struct RowWindow {
    pub start: usize,
    pub end: usize,
}

impl RowWindow {
    pub fn new(start: usize, end: usize) -> Self {
        Self {
            start,
            end: end.max(start),
        }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn contains(&self, index: usize) -> bool {
        index >= self.start && index < self.end
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VirtualizerConfig {
    pub row_height: f32,
    pub overscan: usize,
    /// Distance (in rows) from the end of materialized rows that triggers the next page.
    pub lookahead: usize,
    /// Used until a real viewport is attached.
    pub estimated_viewport_height: f32,
}

impl Default for VirtualizerConfig {
    fn default() -> Self {
        Self {
            row_height: 32.0,
            overscan: 5,
            lookahead: 10,
            estimated_viewport_height: 600.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Virtualizer {
    config: VirtualizerConfig,
    viewport_height: Option<f32>,
    scroll_offset: f32,
    row_count: usize,
    measured: BTreeMap<usize, f32>,
}

impl Virtualizer {
    pub fn new(mut config: VirtualizerConfig) -> Self {
        if config.row_height.is_nan() || config.row_height <= 0.0 {
            config.row_height = VirtualizerConfig::default().row_height;
        }
        Self {
            config,
            viewport_height: None,
            scroll_offset: 0.0,
            row_count: 0,
            measured: BTreeMap::new(),
        }
    }

    pub fn config(&self) -> &VirtualizerConfig {
        &self.config
    }

    pub fn attach(&mut self, viewport_height: f32) {
        self.viewport_height = Some(viewport_height.max(0.0));
    }

    pub fn is_attached(&self) -> bool {
        self.viewport_height.is_some()
    }

    pub fn viewport_height(&self) -> f32 {
        self.viewport_height
            .unwrap_or(self.config.estimated_viewport_height)
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn set_row_count(&mut self, row_count: usize) {
        self.row_count = row_count;
        self.measured.retain(|&i, _| i < row_count);
        self.clamp_offset();
    }

    pub fn scroll_offset(&self) -> f32 {
        self.scroll_offset
    }

    pub fn set_scroll_offset(&mut self, offset: f32) {
        self.scroll_offset = if offset.is_finite() { offset.max(0.0) } else { 0.0 };
        self.clamp_offset();
    }

    fn clamp_offset(&mut self) {
        let max = (self.total_height() - self.viewport_height()).max(0.0);
        if self.scroll_offset > max {
            self.scroll_offset = max;
        }
    }

    /// Records a measured height for one row. Non-positive heights reset it to the estimate.
    pub fn set_row_height(&mut self, index: usize, height: f32) {
        if height > 0.0 && (height - self.config.row_height).abs() > f32::EPSILON {
            self.measured.insert(index, height);
        } else {
            self.measured.remove(&index);
        }
    }

    pub fn row_height(&self, index: usize) -> f32 {
        self.measured
            .get(&index)
            .copied()
            .unwrap_or(self.config.row_height)
    }

    /// Offset of the top edge of row `index` (`index == row_count` gives the total height).
    pub fn row_top(&self, index: usize) -> f32 {
        let base = index as f32 * self.config.row_height;
        let delta: f32 = self
            .measured
            .range(..index)
            .map(|(_, h)| h - self.config.row_height)
            .sum();
        base + delta
    }

    pub fn total_height(&self) -> f32 {
        self.row_top(self.row_count)
    }

    /// First row whose bottom edge lies below `offset`.
    fn first_row_below(&self, offset: f32) -> usize {
        let (mut lo, mut hi) = (0, self.row_count);
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            if self.row_top(mid + 1) > offset {
                hi = mid;
            } else {
                lo = mid + 1;
            }
        }
        lo
    }

    /// First row whose top edge is at or below `offset`.
    fn first_row_starting_at(&self, offset: f32) -> usize {
        let (mut lo, mut hi) = (0, self.row_count);
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            if self.row_top(mid) >= offset {
                hi = mid;
            } else {
                lo = mid + 1;
            }
        }
        lo
    }

    /// Rows intersecting the viewport, without overscan.
    pub fn visible_range(&self) -> RowWindow {
        if self.row_count == 0 {
            return RowWindow::default();
        }
        let top = self.scroll_offset;
        let bottom = top + self.viewport_height();
        let start = self.first_row_below(top).min(self.row_count);
        let end = self.first_row_starting_at(bottom).max(start);
        RowWindow::new(start, end.min(self.row_count))
    }

    /// Visible rows plus overscan on both sides.
    pub fn window(&self) -> RowWindow {
        let visible = self.visible_range();
        let start = visible.start.saturating_sub(self.config.overscan);
        let end = (visible.end + self.config.overscan).min(self.row_count);
        RowWindow::new(start.min(end), end)
    }

    /// Spacer heights above and below `window`.
    pub fn padding(&self, window: RowWindow) -> (f32, f32) {
        let top = self.row_top(window.start);
        let bottom = (self.total_height() - self.row_top(window.end)).max(0.0);
        (top, bottom)
    }

    /// True when `window` is close enough to the end of `materialized` rows to fetch more.
    pub fn needs_more(&self, window: RowWindow, materialized: usize, has_more: bool) -> bool {
        has_more && window.end + self.config.lookahead >= materialized
    }
}
