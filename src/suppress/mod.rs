//! Candidate suppression.
//!
//! Greedy non-maximum suppression over boxes, either globally or independently
//! per group (class) with a stable, contiguous group-by.

pub(crate) mod group;
pub(crate) mod nms;
