//! Diff engine for modmerge.
//!
//! Classifies the lines of a merged text against the original as unchanged,
//! added, removed, or modified. Used both per component and for the
//! whole-catalog view.
//!
//! # Key Types
//!
//! - [`LineDiff`] / [`DiffLine`] / [`DiffType`] -- Classified line output
//! - [`DiffMode`] -- Lookahead heuristic (default) or Myers

pub mod line_diff;

pub use line_diff::{
    diff_lines, diff_lines_myers, diff_with, DiffLine, DiffMode, DiffType, LineDiff,
};
