//! Greedy IoU non-maximum suppression.

use std::cmp::Ordering;

use crate::geometry::{iou_with_areas, BBox};
use crate::suppress::group::group_runs;
use crate::trace::{trace_event, trace_span};
use crate::util::{YoloPostError, YoloPostResult};

/// Descending score, then ascending index.
fn score_cmp_desc(scores: &[f32], a: usize, b: usize) -> Ordering {
    scores[b].total_cmp(&scores[a]).then_with(|| a.cmp(&b))
}

/// Sorts indices by descending score with deterministic tie-breaking.
pub(crate) fn sort_indices_desc(indices: &mut [usize], scores: &[f32]) {
    indices.sort_by(|&a, &b| score_cmp_desc(scores, a, b));
}

fn check_inputs(boxes: &[BBox], scores: &[f32], iou_threshold: f32) -> YoloPostResult<()> {
    if boxes.len() != scores.len() {
        return Err(YoloPostError::LengthMismatch {
            expected: boxes.len(),
            got: scores.len(),
            context: "scores",
        });
    }
    if let Some(index) = scores.iter().position(|s| !s.is_finite()) {
        return Err(YoloPostError::NonFiniteScore { index });
    }
    if iou_threshold.is_nan() {
        return Err(YoloPostError::InvalidConfig {
            reason: "iou_threshold must not be NaN",
        });
    }
    Ok(())
}

/// Runs greedy suppression over `order`, which must already be score-sorted.
fn greedy(boxes: &[BBox], areas: &[f32], order: &[usize], iou_threshold: f32) -> Vec<usize> {
    let mut suppressed = vec![false; boxes.len()];
    let mut keep = Vec::new();

    for (pos, &i) in order.iter().enumerate() {
        if suppressed[i] {
            continue;
        }
        keep.push(i);
        for &j in &order[pos + 1..] {
            if suppressed[j] {
                continue;
            }
            if iou_with_areas(&boxes[i], areas[i], &boxes[j], areas[j]) >= iou_threshold {
                suppressed[j] = true;
            }
        }
    }

    keep
}

/// Applies greedy non-maximum suppression to all boxes as one group.
///
/// Returns indices into `boxes` of the retained subset, sorted by descending
/// score; equal scores keep ascending index order. A box is suppressed when
/// its IoU with an already retained box is at least `iou_threshold`.
pub fn nms(boxes: &[BBox], scores: &[f32], iou_threshold: f32) -> YoloPostResult<Vec<usize>> {
    check_inputs(boxes, scores, iou_threshold)?;
    let _span = trace_span!("nms", candidates = boxes.len()).entered();

    let mut order: Vec<usize> = (0..boxes.len()).collect();
    sort_indices_desc(&mut order, scores);
    let areas: Vec<f32> = boxes.iter().map(BBox::area).collect();
    let keep = greedy(boxes, &areas, &order, iou_threshold);

    trace_event!("nms_kept", count = keep.len());
    Ok(keep)
}

/// Applies non-maximum suppression independently within each group.
///
/// Boxes with different `groups` keys never suppress each other. The merged
/// result is sorted by descending score like [`nms`].
pub fn nms_grouped(
    boxes: &[BBox],
    scores: &[f32],
    groups: &[usize],
    iou_threshold: f32,
) -> YoloPostResult<Vec<usize>> {
    check_inputs(boxes, scores, iou_threshold)?;
    if groups.len() != boxes.len() {
        return Err(YoloPostError::LengthMismatch {
            expected: boxes.len(),
            got: groups.len(),
            context: "groups",
        });
    }
    let _span = trace_span!("nms_grouped", candidates = boxes.len()).entered();

    let mut order: Vec<usize> = (0..boxes.len()).collect();
    sort_indices_desc(&mut order, scores);
    let areas: Vec<f32> = boxes.iter().map(BBox::area).collect();

    let runs = group_runs(groups, &order);
    let mut keep = Vec::with_capacity(order.len());
    for (_, members) in &runs {
        keep.extend(greedy(boxes, &areas, members, iou_threshold));
    }
    sort_indices_desc(&mut keep, scores);

    trace_event!("nms_kept", count = keep.len(), groups = runs.len());
    Ok(keep)
}

#[cfg(test)]
mod tests {
    use super::{nms, nms_grouped};
    use crate::geometry::BBox;
    use crate::util::YoloPostError;

    #[test]
    fn keeps_higher_score_of_overlapping_pair() {
        let boxes = [BBox::new(0.0, 0.0, 10.0, 10.0), BBox::new(1.0, 1.0, 10.0, 10.0)];
        let keep = nms(&boxes, &[0.6, 0.9], 0.5).unwrap();
        assert_eq!(keep, vec![1]);
    }

    #[test]
    fn iou_equal_to_threshold_suppresses() {
        // box 1 covers the top half of box 0: IoU is exactly 0.5
        let boxes = [BBox::new(0.0, 0.0, 10.0, 10.0), BBox::new(0.0, 0.0, 10.0, 5.0)];
        let keep = nms(&boxes, &[0.9, 0.8], 0.5).unwrap();
        assert_eq!(keep, vec![0]);
    }

    #[test]
    fn equal_scores_keep_lower_index_first() {
        let boxes = [
            BBox::new(100.0, 0.0, 5.0, 5.0),
            BBox::new(0.0, 0.0, 5.0, 5.0),
            BBox::new(0.5, 0.0, 5.0, 5.0),
        ];
        let keep = nms(&boxes, &[0.7, 0.7, 0.7], 0.3).unwrap();
        assert_eq!(keep, vec![0, 1]);
    }

    #[test]
    fn grouped_never_suppresses_across_groups() {
        let boxes = [BBox::new(0.0, 0.0, 10.0, 10.0), BBox::new(0.0, 0.0, 10.0, 9.0)];
        let keep = nms_grouped(&boxes, &[0.5, 0.9], &[3, 7], 0.35).unwrap();
        assert_eq!(keep, vec![1, 0]);
        let keep = nms_grouped(&boxes, &[0.5, 0.9], &[3, 3], 0.35).unwrap();
        assert_eq!(keep, vec![1]);
    }

    #[test]
    fn rejects_mismatched_lengths_and_nan_scores() {
        let boxes = [BBox::new(0.0, 0.0, 1.0, 1.0)];
        assert_eq!(
            nms(&boxes, &[], 0.5).err().unwrap(),
            YoloPostError::LengthMismatch {
                expected: 1,
                got: 0,
                context: "scores",
            }
        );
        assert_eq!(
            nms(&boxes, &[f32::NAN], 0.5).err().unwrap(),
            YoloPostError::NonFiniteScore { index: 0 }
        );
        assert!(nms_grouped(&boxes, &[0.5], &[], 0.5).is_err());
    }

    #[test]
    fn empty_input_is_empty_output() {
        assert!(nms(&[], &[], 0.5).unwrap().is_empty());
        assert!(nms_grouped(&[], &[], &[], 0.5).unwrap().is_empty());
    }
}
