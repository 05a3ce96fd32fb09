//! Detection head decoding: arg-max classification and box rescaling.

use std::ops::Range;

use crate::decode::{BoxChannels, Detection, GateParams};
use crate::geometry::ScaleFactors;
use crate::tensor::DetectView;
use crate::trace::{trace_event, trace_skip, trace_span};

/// Decodes a detection head into at most `gate.max_candidates` detections.
///
/// Candidates are visited in index order. The class is the arg-max over all
/// class channels; on equal scores the lowest class index wins, and a class
/// must score above zero to be picked at all. Candidates whose best score is
/// not strictly greater than `gate.score_threshold` are dropped.
pub fn decode_detections(
    view: &DetectView<'_>,
    scale: ScaleFactors,
    gate: GateParams,
) -> Vec<Detection> {
    let _span = trace_span!(
        "decode_detect",
        candidates = view.num_candidates(),
        classes = view.num_classes()
    )
    .entered();

    let mut out = Vec::with_capacity(gate.max_candidates.min(view.num_candidates()));
    decode_detect_range(view, scale, gate, 0..view.num_candidates(), &mut out);

    trace_event!("detect_candidates", count = out.len());
    out
}

/// Returns `(class, score)` of the best class for candidate `i`.
#[inline]
pub(crate) fn argmax_class(view: &DetectView<'_>, i: usize) -> Option<(usize, f32)> {
    let mut max_score = 0.0f32;
    let mut best = None;
    for (class, row) in view.class_channels().enumerate() {
        let score = row[i];
        if score > max_score {
            max_score = score;
            best = Some((class, score));
        }
    }
    best
}

/// Decodes candidates in `range`, appending to `out` until it holds
/// `gate.max_candidates` items.
pub(crate) fn decode_detect_range(
    view: &DetectView<'_>,
    scale: ScaleFactors,
    gate: GateParams,
    range: Range<usize>,
    out: &mut Vec<Detection>,
) {
    let boxes = BoxChannels::new(|attr| view.bbox_channel(attr));

    #[cfg(feature = "simd")]
    crate::decode::simd::decode_detect_range_simd(view, &boxes, scale, gate, range, out);

    #[cfg(not(feature = "simd"))]
    for i in range {
        if out.len() >= gate.max_candidates {
            break;
        }
        let Some((class_index, score)) = argmax_class(view, i) else {
            continue;
        };
        push_detection(&boxes, scale, gate, i, class_index, score, out);
    }
}

/// Applies the score gate to one arg-max result and appends the detection.
#[inline]
pub(crate) fn push_detection(
    boxes: &BoxChannels<'_>,
    scale: ScaleFactors,
    gate: GateParams,
    i: usize,
    class_index: usize,
    score: f32,
    out: &mut Vec<Detection>,
) {
    if !score.is_finite() {
        trace_skip!("skip_non_finite_score", index = i);
        return;
    }
    if !gate.passes(score) {
        return;
    }
    match boxes.decode(i, scale) {
        Some(bbox) => out.push(Detection {
            bbox,
            class_index,
            score,
        }),
        None => {
            trace_skip!("skip_non_finite_box", index = i);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{argmax_class, decode_detections};
    use crate::decode::GateParams;
    use crate::geometry::{BBox, ScaleFactors};
    use crate::tensor::{DetectView, TensorView};

    fn gate(score_threshold: f32) -> GateParams {
        GateParams {
            score_threshold,
            max_candidates: 50,
        }
    }

    #[test]
    fn argmax_prefers_first_class_on_ties() {
        // one candidate, three classes scoring 0.5, 0.7, 0.7
        let data = [0.0, 0.0, 1.0, 1.0, 0.5, 0.7, 0.7];
        let tensor = TensorView::new(&data, [1, 7, 1]).unwrap();
        let view = DetectView::new(tensor, 3).unwrap();
        assert_eq!(argmax_class(&view, 0), Some((1, 0.7)));
    }

    #[test]
    fn argmax_ignores_non_positive_scores() {
        let data = [0.0, 0.0, 1.0, 1.0, 0.0, -0.3];
        let tensor = TensorView::new(&data, [1, 6, 1]).unwrap();
        let view = DetectView::new(tensor, 2).unwrap();
        assert_eq!(argmax_class(&view, 0), None);
    }

    #[test]
    fn score_equal_to_threshold_is_dropped() {
        let data = [10.0, 10.0, 4.0, 4.0, 0.5];
        let tensor = TensorView::new(&data, [1, 5, 1]).unwrap();
        let view = DetectView::new(tensor, 1).unwrap();
        assert!(decode_detections(&view, ScaleFactors::IDENTITY, gate(0.5)).is_empty());
        let kept = decode_detections(&view, ScaleFactors::IDENTITY, gate(0.49));
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].bbox, BBox::new(8.0, 8.0, 4.0, 4.0));
    }

    #[test]
    fn non_finite_boxes_are_skipped() {
        // candidate 0 has a NaN width, candidate 1 is fine
        let data = [
            10.0,
            20.0, // cx
            10.0,
            20.0, // cy
            f32::NAN,
            2.0, // w
            4.0,
            2.0, // h
            0.9,
            0.9, // class 0
        ];
        let tensor = TensorView::new(&data, [1, 5, 2]).unwrap();
        let view = DetectView::new(tensor, 1).unwrap();
        let out = decode_detections(&view, ScaleFactors::IDENTITY, gate(0.1));
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].bbox, BBox::new(19.0, 19.0, 2.0, 2.0));
    }
}
