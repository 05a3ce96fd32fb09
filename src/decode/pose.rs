//! Pose head decoding: one implicit person class plus keypoints.

use std::ops::Range;

use crate::decode::{BoxChannels, GateParams, Keypoint, Pose};
use crate::geometry::ScaleFactors;
use crate::tensor::{KeypointAttr, PoseView};
use crate::trace::{trace_event, trace_skip, trace_span};

/// Keypoint channels resolved once per call.
struct KeypointChannels<'a> {
    x: &'a [f32],
    y: &'a [f32],
    score: &'a [f32],
}

fn keypoint_channels<'a>(view: &PoseView<'a>) -> Vec<KeypointChannels<'a>> {
    (0..view.num_keypoints())
        .filter_map(|kp| {
            Some(KeypointChannels {
                x: view.keypoint_channel(kp, KeypointAttr::X)?,
                y: view.keypoint_channel(kp, KeypointAttr::Y)?,
                score: view.keypoint_channel(kp, KeypointAttr::Score)?,
            })
        })
        .collect()
}

/// Decodes a pose head into at most `gate.max_candidates` poses.
///
/// The box confidence is read directly from channel 4. Keypoint coordinates
/// are scaled like the box; keypoint scores are passed through unchanged, so
/// low-confidence keypoints remain in the output with their raw score.
pub fn decode_poses(view: &PoseView<'_>, scale: ScaleFactors, gate: GateParams) -> Vec<Pose> {
    let _span = trace_span!(
        "decode_pose",
        candidates = view.num_candidates(),
        keypoints = view.num_keypoints()
    )
    .entered();

    let mut out = Vec::with_capacity(gate.max_candidates.min(view.num_candidates()));
    decode_pose_range(view, scale, gate, 0..view.num_candidates(), &mut out);

    trace_event!("pose_candidates", count = out.len());
    out
}

pub(crate) fn decode_pose_range(
    view: &PoseView<'_>,
    scale: ScaleFactors,
    gate: GateParams,
    range: Range<usize>,
    out: &mut Vec<Pose>,
) {
    let boxes = BoxChannels::new(|attr| view.bbox_channel(attr));
    let keypoint_rows = keypoint_channels(view);
    let scores = view.score_channel();

    for i in range {
        if out.len() >= gate.max_candidates {
            break;
        }
        let score = scores[i];
        if !score.is_finite() {
            trace_skip!("skip_non_finite_score", index = i);
            continue;
        }
        if !gate.passes(score) {
            continue;
        }
        let Some(bbox) = boxes.decode(i, scale) else {
            trace_skip!("skip_non_finite_box", index = i);
            continue;
        };

        let mut keypoints = Vec::with_capacity(keypoint_rows.len());
        for rows in &keypoint_rows {
            let (x, y) = scale.scale_point(rows.x[i], rows.y[i]);
            keypoints.push(Keypoint {
                x,
                y,
                score: rows.score[i],
            });
        }
        if keypoints.iter().any(|kp| !(kp.x.is_finite() && kp.y.is_finite())) {
            trace_skip!("skip_non_finite_keypoint", index = i);
            continue;
        }

        out.push(Pose {
            bbox,
            score,
            keypoints,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::decode_poses;
    use crate::decode::GateParams;
    use crate::geometry::{BBox, ScaleFactors};
    use crate::tensor::{PoseView, TensorView};

    fn single_pose(score: f32, num_keypoints: usize) -> Vec<f32> {
        let mut data = vec![40.0, 60.0, 20.0, 30.0, score];
        for kp in 0..num_keypoints {
            data.extend_from_slice(&[kp as f32, 10.0 * kp as f32, 0.1 * kp as f32]);
        }
        data
    }

    #[test]
    fn scales_box_and_keypoints() {
        let data = single_pose(0.8, 3);
        let channels = PoseView::expected_channels(3).unwrap();
        let tensor = TensorView::new(&data, [1, channels, 1]).unwrap();
        let view = PoseView::new(tensor, 3).unwrap();
        let scale = ScaleFactors::new(2.0, 0.5).unwrap();
        let gate = GateParams {
            score_threshold: 0.5,
            max_candidates: 50,
        };
        let poses = decode_poses(&view, scale, gate);
        assert_eq!(poses.len(), 1);
        assert_eq!(poses[0].bbox, BBox::new(60.0, 22.5, 40.0, 15.0));
        assert_eq!(poses[0].keypoints.len(), 3);
        assert_eq!(poses[0].keypoints[2].x, 4.0);
        assert_eq!(poses[0].keypoints[2].y, 10.0);
        assert!((poses[0].keypoints[2].score - 0.2).abs() < 1e-6);
    }

    #[test]
    fn box_score_at_threshold_is_dropped() {
        let data = single_pose(0.5, 1);
        let tensor = TensorView::new(&data, [1, 8, 1]).unwrap();
        let view = PoseView::new(tensor, 1).unwrap();
        let gate = GateParams {
            score_threshold: 0.5,
            max_candidates: 50,
        };
        assert!(decode_poses(&view, ScaleFactors::IDENTITY, gate).is_empty());
    }
}
