//! Two-dimensional row/column virtualizer.
//!
//! The window is a pure function of the quantized scroll state, the viewport metrics, the
//! options and a [`RowSource`]. [`Virtualizer2D`] wraps that function with frame scheduling:
//! scroll and resize signals only overwrite pending values, and [`Virtualizer2D::frame`] applies
//! them once per animation tick.

use crate::scroll::{ScrollPosition, ScrollState, ViewportMetrics};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::ops::RangeInclusive;
use tracing::trace;

/// Rows the virtualizer lays out.
pub trait RowSource {
    /// Number of rows.
    fn row_count(&self) -> usize;
    /// Length of `row` in characters.
    fn row_len(&self, row: usize) -> usize;
    /// Stable identity of `row`.
    fn row_id(&self, row: usize) -> u64;
}

/// Virtualizer tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VirtualizerOptions {
    /// Extra rows laid out above and below the viewport.
    pub overscan_rows: usize,
    /// Extra columns laid out left and right of the viewport, for long rows.
    pub overscan_columns: usize,
    /// Rows at or below this length are always laid out in full.
    pub full_row_threshold: usize,
}

impl Default for VirtualizerOptions {
    fn default() -> Self {
        Self {
            overscan_rows: 5,
            overscan_columns: 16,
            full_row_threshold: 500,
        }
    }
}

/// One laid-out row.
#[derive(Debug, Clone, PartialEq)]
pub struct VirtualItem2D {
    /// Row index.
    pub index: usize,
    /// Top edge in pixels.
    pub start_px: f64,
    /// Height in pixels.
    pub size_px: f64,
    /// First visible column.
    pub column_start: usize,
    /// End of the visible columns (exclusive). Never less than `column_start`.
    pub column_end: usize,
    /// Stable identity of the row.
    pub line_id: u64,
}

/// Work done by one [`Virtualizer2D::frame`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameStats {
    /// Whether the window was recomputed.
    pub recomputed: bool,
    /// Items updated in place.
    pub reused: usize,
    /// Items created for rows that entered the window.
    pub created: usize,
    /// Items dropped for rows that left the window.
    pub dropped: usize,
}

/// Rows to lay out, overscan included. `None` when nothing is visible.
pub fn row_range(
    scroll: ScrollState,
    metrics: &ViewportMetrics,
    row_count: usize,
    options: &VirtualizerOptions,
) -> Option<RangeInclusive<usize>> {
    let visible = metrics.visible_rows();
    if row_count == 0 || visible == 0 {
        return None;
    }
    let last = row_count - 1;
    let row_end = scroll.first_row.saturating_add(visible - 1);
    let start = scroll
        .first_row
        .saturating_sub(options.overscan_rows)
        .min(last);
    let end = row_end.saturating_add(options.overscan_rows).min(last);
    Some(start..=end)
}

/// Visible `(column_start, column_end)` of a row of `len` characters.
///
/// Short rows are laid out in full. Long rows are sliced around the scroll column and collapse
/// to an empty range once scrolled past their content.
pub fn column_range(
    len: usize,
    first_column: usize,
    visible_columns: usize,
    options: &VirtualizerOptions,
) -> (usize, usize) {
    if len <= options.full_row_threshold {
        return (0, len);
    }
    let start = first_column.saturating_sub(options.overscan_columns).min(len);
    let end = first_column
        .saturating_add(visible_columns)
        .saturating_add(options.overscan_columns)
        .min(len);
    (start, end.max(start))
}

/// Lay out the window for `scroll`, in row order.
pub fn visible_items(
    source: &impl RowSource,
    scroll: ScrollState,
    metrics: &ViewportMetrics,
    options: &VirtualizerOptions,
) -> Vec<VirtualItem2D> {
    let Some(rows) = row_range(scroll, metrics, source.row_count(), options) else {
        return Vec::new();
    };
    let visible_columns = metrics.visible_columns();
    rows.map(|row| {
        let (column_start, column_end) = column_range(
            source.row_len(row),
            scroll.first_column,
            visible_columns,
            options,
        );
        VirtualItem2D {
            index: row,
            start_px: row as f64 * metrics.row_height,
            size_px: metrics.row_height,
            column_start,
            column_end,
            line_id: source.row_id(row),
        }
    })
    .collect()
}

/// Frame-scheduled virtualizer with items cached by line id.
#[derive(Debug, Clone, Default)]
pub struct Virtualizer2D {
    options: VirtualizerOptions,
    metrics: ViewportMetrics,
    position: ScrollPosition,
    scroll: ScrollState,
    pending_scroll: Option<ScrollPosition>,
    pending_metrics: Option<ViewportMetrics>,
    last_revision: Option<u64>,
    items: HashMap<u64, VirtualItem2D>,
    order: Vec<u64>,
}

impl Virtualizer2D {
    /// Create a virtualizer. Nothing is laid out until the first [`frame`](Self::frame).
    pub fn new(options: VirtualizerOptions, metrics: ViewportMetrics) -> Self {
        Self {
            options,
            pending_metrics: Some(metrics),
            ..Self::default()
        }
    }

    /// Options in effect.
    pub fn options(&self) -> &VirtualizerOptions {
        &self.options
    }

    /// Change the options; takes effect on the next frame.
    pub fn set_options(&mut self, options: VirtualizerOptions) {
        if self.options != options {
            self.options = options;
            self.last_revision = None;
        }
    }

    /// Metrics applied by the last frame.
    pub fn metrics(&self) -> &ViewportMetrics {
        &self.metrics
    }

    /// Quantized scroll state applied by the last frame.
    pub fn scroll_state(&self) -> ScrollState {
        self.scroll
    }

    /// Record a scroll event. Overwrites any scroll not yet applied.
    pub fn set_scroll(&mut self, top: f64, left: f64) {
        self.pending_scroll = Some(ScrollPosition::new(top, left));
    }

    /// Record a viewport resize. Overwrites any resize not yet applied.
    pub fn set_viewport_size(&mut self, width: f64, height: f64) {
        let base = self.pending_metrics.unwrap_or(self.metrics);
        self.pending_metrics = Some(ViewportMetrics {
            width,
            height,
            ..base
        });
    }

    /// Record new metrics, e.g. after a font change.
    pub fn set_metrics(&mut self, metrics: ViewportMetrics) {
        self.pending_metrics = Some(metrics);
    }

    /// Whether a scroll or resize is waiting for the next frame.
    pub fn has_pending(&self) -> bool {
        self.pending_scroll.is_some() || self.pending_metrics.is_some()
    }

    /// Apply pending signals and recompute the window if anything it depends on changed.
    ///
    /// `revision` is the document revision; a new revision always recomputes.
    pub fn frame(&mut self, source: &impl RowSource, revision: u64) -> FrameStats {
        let mut changed = self.last_revision != Some(revision);

        if let Some(metrics) = self.pending_metrics.take()
            && metrics != self.metrics
        {
            self.metrics = metrics;
            changed = true;
        }
        if let Some(position) = self.pending_scroll.take() {
            self.position = position;
        }
        let scroll = ScrollState::quantize(self.position, &self.metrics);
        if scroll != self.scroll {
            self.scroll = scroll;
            changed = true;
        }

        if !changed {
            trace!(revision, "viewport frame skipped");
            return FrameStats::default();
        }

        let window = visible_items(source, self.scroll, &self.metrics, &self.options);
        let mut stats = FrameStats {
            recomputed: true,
            ..FrameStats::default()
        };

        let mut order = Vec::with_capacity(window.len());
        for item in window {
            order.push(item.line_id);
            match self.items.get_mut(&item.line_id) {
                Some(existing) => {
                    *existing = item;
                    stats.reused += 1;
                }
                None => {
                    self.items.insert(item.line_id, item);
                    stats.created += 1;
                }
            }
        }

        let live: HashSet<u64> = order.iter().copied().collect();
        let before = self.items.len();
        self.items.retain(|id, _| live.contains(id));
        stats.dropped = before - self.items.len();
        self.order = order;
        self.last_revision = Some(revision);

        trace!(
            revision,
            first_row = self.scroll.first_row,
            first_column = self.scroll.first_column,
            rows = self.order.len(),
            created = stats.created,
            dropped = stats.dropped,
            "viewport frame recomputed"
        );
        stats
    }

    /// The laid-out window in row order.
    pub fn items(&self) -> impl Iterator<Item = &VirtualItem2D> + '_ {
        self.order.iter().filter_map(|id| self.items.get(id))
    }

    /// Number of laid-out rows.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns `true` if nothing is laid out.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// The cached item for `line_id`, if the line is in the window.
    pub fn item_for_line(&self, line_id: u64) -> Option<&VirtualItem2D> {
        self.items.get(&line_id)
    }

    /// Total content height for `source`.
    pub fn content_height(&self, source: &impl RowSource) -> f64 {
        source.row_count() as f64 * self.metrics.row_height
    }
}
