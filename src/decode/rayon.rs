//! Rayon-parallel decoders (feature-gated).
//!
//! The candidate range is split into fixed-size chunks decoded independently.
//! Chunk results are concatenated in chunk order and truncated to the cap, so
//! the output is identical to the sequential scan.

use crate::decode::detect::decode_detect_range;
use crate::decode::pose::decode_pose_range;
use crate::decode::{Detection, GateParams, Pose};
use crate::geometry::ScaleFactors;
use crate::tensor::{DetectView, PoseView};
use crate::trace::{trace_event, trace_span};
use rayon::prelude::*;

const CHUNK_CANDIDATES: usize = 1024;

fn merge_in_order<T>(chunks: Vec<Vec<T>>, cap: usize) -> Vec<T> {
    let total: usize = chunks.iter().map(Vec::len).sum();
    let mut out = Vec::with_capacity(total.min(cap));
    for chunk in chunks {
        let room = cap.saturating_sub(out.len());
        if room == 0 {
            break;
        }
        out.extend(chunk.into_iter().take(room));
    }
    out
}

/// Parallel counterpart of [`crate::decode::decode_detections`].
pub fn decode_detections_par(
    view: &DetectView<'_>,
    scale: ScaleFactors,
    gate: GateParams,
) -> Vec<Detection> {
    let _span = trace_span!(
        "decode_detect",
        candidates = view.num_candidates(),
        classes = view.num_classes(),
        parallel = true
    )
    .entered();

    let n = view.num_candidates();
    let chunks: Vec<Vec<Detection>> = (0..n.div_ceil(CHUNK_CANDIDATES))
        .into_par_iter()
        .map(|chunk| {
            let start = chunk * CHUNK_CANDIDATES;
            let end = (start + CHUNK_CANDIDATES).min(n);
            let mut local = Vec::new();
            decode_detect_range(view, scale, gate, start..end, &mut local);
            local
        })
        .collect();

    let out = merge_in_order(chunks, gate.max_candidates);
    trace_event!("detect_candidates", count = out.len());
    out
}

/// Parallel counterpart of [`crate::decode::decode_poses`].
pub fn decode_poses_par(view: &PoseView<'_>, scale: ScaleFactors, gate: GateParams) -> Vec<Pose> {
    let _span = trace_span!(
        "decode_pose",
        candidates = view.num_candidates(),
        keypoints = view.num_keypoints(),
        parallel = true
    )
    .entered();

    let n = view.num_candidates();
    let chunks: Vec<Vec<Pose>> = (0..n.div_ceil(CHUNK_CANDIDATES))
        .into_par_iter()
        .map(|chunk| {
            let start = chunk * CHUNK_CANDIDATES;
            let end = (start + CHUNK_CANDIDATES).min(n);
            let mut local = Vec::new();
            decode_pose_range(view, scale, gate, start..end, &mut local);
            local
        })
        .collect();

    let out = merge_in_order(chunks, gate.max_candidates);
    trace_event!("pose_candidates", count = out.len());
    out
}

#[cfg(test)]
mod tests {
    use super::merge_in_order;

    #[test]
    fn merge_keeps_chunk_order_and_cap() {
        let chunks = vec![vec![1, 2], vec![], vec![3, 4, 5], vec![6]];
        assert_eq!(merge_in_order(chunks.clone(), 4), vec![1, 2, 3, 4]);
        assert_eq!(merge_in_order(chunks, 10), vec![1, 2, 3, 4, 5, 6]);
    }
}
