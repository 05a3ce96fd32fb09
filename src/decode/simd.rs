//! SIMD arg-max for the detection head using the `wide` crate.
//!
//! Class scores are channel-major, so eight neighbouring candidates share one
//! contiguous run per class channel. The arg-max walks the class channels once
//! per block of eight candidates and keeps a running maximum per lane. A
//! strict `simd_gt` keeps the first class that reached the maximum, which
//! matches the scalar path exactly.

use std::ops::Range;

use crate::decode::detect::{argmax_class, push_detection};
use crate::decode::{BoxChannels, Detection, GateParams};
use crate::geometry::ScaleFactors;
use crate::tensor::DetectView;
use wide::f32x8;

const LANES: usize = 8;

/// Load 8 f32 values into f32x8.
#[inline]
fn load_f32x8(slice: &[f32]) -> f32x8 {
    f32x8::from([
        slice[0], slice[1], slice[2], slice[3], slice[4], slice[5], slice[6], slice[7],
    ])
}

/// Arg-max for candidates `start..start + 8`.
///
/// Returns per-lane `(class, score)`; class is -1 when no class scored above zero.
#[inline]
pub(crate) fn argmax_block(view: &DetectView<'_>, start: usize) -> ([f32; LANES], [f32; LANES]) {
    let mut best = f32x8::ZERO;
    let mut class = f32x8::splat(-1.0);
    for (c, row) in view.class_channels().enumerate() {
        let scores = load_f32x8(&row[start..start + LANES]);
        let mask = scores.simd_gt(best);
        best = mask.blend(scores, best);
        class = mask.blend(f32x8::splat(c as f32), class);
    }
    (class.to_array(), best.to_array())
}

pub(crate) fn decode_detect_range_simd(
    view: &DetectView<'_>,
    boxes: &BoxChannels<'_>,
    scale: ScaleFactors,
    gate: GateParams,
    range: Range<usize>,
    out: &mut Vec<Detection>,
) {
    let len = range.end.saturating_sub(range.start);
    let simd_end = range.start + len / LANES * LANES;

    let mut start = range.start;
    while start < simd_end {
        if out.len() >= gate.max_candidates {
            return;
        }
        let (classes, scores) = argmax_block(view, start);
        for lane in 0..LANES {
            if out.len() >= gate.max_candidates {
                return;
            }
            if classes[lane] < 0.0 {
                continue;
            }
            push_detection(
                boxes,
                scale,
                gate,
                start + lane,
                classes[lane] as usize,
                scores[lane],
                out,
            );
        }
        start += LANES;
    }

    for i in simd_end..range.end {
        if out.len() >= gate.max_candidates {
            return;
        }
        if let Some((class_index, score)) = argmax_class(view, i) {
            push_detection(boxes, scale, gate, i, class_index, score, out);
        }
    }
}
