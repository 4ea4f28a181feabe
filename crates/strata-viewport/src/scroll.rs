//! Viewport metrics and scroll quantization.

use serde::{Deserialize, Serialize};

/// Pixel geometry of the viewport and its text grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportMetrics {
    /// Height of one row.
    pub row_height: f64,
    /// Width of one character cell.
    pub char_width: f64,
    /// Viewport width.
    pub width: f64,
    /// Viewport height.
    pub height: f64,
}

impl Default for ViewportMetrics {
    fn default() -> Self {
        Self {
            row_height: 0.0,
            char_width: 0.0,
            width: 0.0,
            height: 0.0,
        }
    }
}

impl ViewportMetrics {
    /// Create metrics from a cell size and a viewport size.
    pub fn new(row_height: f64, char_width: f64, width: f64, height: f64) -> Self {
        Self {
            row_height,
            char_width,
            width,
            height,
        }
    }

    /// Whether the cell size cannot lay out any row.
    pub fn is_degenerate(&self) -> bool {
        !is_positive(self.row_height) || !is_positive(self.char_width)
    }

    /// `ceil(height / row_height)`, or 0 for degenerate metrics.
    pub fn visible_rows(&self) -> usize {
        if self.is_degenerate() || !is_positive(self.height) {
            return 0;
        }
        (self.height / self.row_height).ceil() as usize
    }

    /// `floor(width / char_width)`, or 0 for degenerate metrics.
    ///
    /// A trailing partial cell is left to the horizontal overscan, so a sliced row never spans
    /// more than `width / char_width + 2 * overscan_columns` columns.
    pub fn visible_columns(&self) -> usize {
        if self.is_degenerate() || !is_positive(self.width) {
            return 0;
        }
        (self.width / self.char_width).floor() as usize
    }
}

fn is_positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

/// Raw scroll offsets, as reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScrollPosition {
    /// Vertical offset.
    pub top: f64,
    /// Horizontal offset.
    pub left: f64,
}

impl ScrollPosition {
    /// Create a scroll position.
    pub fn new(top: f64, left: f64) -> Self {
        Self { top, left }
    }
}

/// Scroll position snapped to whole rows and columns.
///
/// Two raw positions that snap to the same state produce the same window, so sub-row scroll
/// deltas never cause a recomputation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ScrollState {
    /// First visible row.
    pub first_row: usize,
    /// First visible column.
    pub first_column: usize,
}

impl ScrollState {
    /// Snap `position` to the nearest row and column.
    pub fn quantize(position: ScrollPosition, metrics: &ViewportMetrics) -> Self {
        Self {
            first_row: quantize_index(position.top, metrics.row_height),
            first_column: quantize_index(position.left, metrics.char_width),
        }
    }

    /// Published vertical offset in pixels.
    pub fn top_px(&self, metrics: &ViewportMetrics) -> f64 {
        self.first_row as f64 * metrics.row_height
    }

    /// Published horizontal offset in pixels.
    pub fn left_px(&self, metrics: &ViewportMetrics) -> f64 {
        self.first_column as f64 * metrics.char_width
    }
}

/// Index of the multiple of `step` nearest to `px`. Negative, non-finite or degenerate input
/// snaps to 0.
pub fn quantize_index(px: f64, step: f64) -> usize {
    if !is_positive(step) || !is_positive(px) {
        return 0;
    }
    (px / step).round() as usize
}
