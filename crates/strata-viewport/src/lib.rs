#![warn(missing_docs)]
//! Viewport virtualization for editor views.
//!
//! Given a scroll position, the viewport size, a row height, a character width and a way to ask
//! for the length of each row, [`Virtualizer2D`] computes which rows to lay out and, per row,
//! which column slice to lay out. It knows nothing about text; documents plug in through
//! [`RowSource`].
//!
//! ```rust
//! use strata_viewport::{RowSource, ViewportMetrics, Virtualizer2D, VirtualizerOptions};
//!
//! struct Lines(Vec<String>);
//!
//! impl RowSource for Lines {
//!     fn row_count(&self) -> usize {
//!         self.0.len()
//!     }
//!     fn row_len(&self, row: usize) -> usize {
//!         self.0[row].chars().count()
//!     }
//!     fn row_id(&self, row: usize) -> u64 {
//!         row as u64
//!     }
//! }
//!
//! let lines = Lines((0..1000).map(|i| format!("line {i}")).collect());
//! let metrics = ViewportMetrics::new(16.0, 8.0, 640.0, 480.0);
//! let mut virtualizer = Virtualizer2D::new(VirtualizerOptions::default(), metrics);
//!
//! virtualizer.set_scroll(1600.0, 0.0);
//! virtualizer.frame(&lines, 0);
//! let first = virtualizer.items().next().map(|item| item.index);
//! assert_eq!(first, Some(95));
//! ```

pub mod scroll;
pub mod virtualizer;

pub use scroll::{ScrollPosition, ScrollState, ViewportMetrics, quantize_index};
pub use virtualizer::{
    FrameStats, RowSource, VirtualItem2D, Virtualizer2D, VirtualizerOptions, column_range,
    row_range, visible_items,
};
