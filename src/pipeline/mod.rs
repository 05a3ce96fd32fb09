//! Task dispatch from a raw output tensor to suppressed predictions.
//!
//! `decode_and_suppress` validates the configuration and the tensor layout,
//! decodes the head for the configured task, and runs suppression: per class
//! for detection (unless `class_agnostic`), globally for pose.

use std::fmt;
use std::str::FromStr;

use crate::decode::{decode_detections, decode_poses, Detection, GateParams, Pose};
use crate::geometry::{BBox, ScaleFactors};
use crate::skeleton::NUM_COCO_KEYPOINTS;
use crate::suppress::nms::{nms, nms_grouped};
use crate::tensor::{DetectView, PoseView, TensorView};
use crate::trace::{trace_event, trace_span};
use crate::util::{YoloPostError, YoloPostResult};

/// Network head the output tensor comes from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Task {
    #[default]
    Detect,
    Pose,
    /// Recognized but not decoded.
    Segment,
}

impl Task {
    pub fn as_str(self) -> &'static str {
        match self {
            Task::Detect => "detect",
            Task::Pose => "pose",
            Task::Segment => "segment",
        }
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Task {
    type Err = YoloPostError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "detect" => Ok(Task::Detect),
            "pose" => Ok(Task::Pose),
            "segment" => Ok(Task::Segment),
            _ => Err(YoloPostError::UnknownTask {
                name: s.to_string(),
            }),
        }
    }
}

/// Configuration for one pipeline invocation.
#[derive(Clone, Debug, PartialEq)]
pub struct PipelineConfig {
    /// Head to decode.
    pub task: Task,
    /// Candidates must score strictly above this value.
    pub score_threshold: f32,
    /// Boxes in one group with IoU at or above this value are suppressed.
    pub iou_threshold: f32,
    /// Decoder cap on emitted candidates (scan order, not best-first).
    pub max_candidates: usize,
    /// Class channels in a detection head.
    pub num_classes: usize,
    /// Keypoints in a pose head.
    pub num_keypoints: usize,
    /// Suppress detections across classes instead of per class.
    pub class_agnostic: bool,
    /// Decode with rayon when the `rayon` feature is enabled.
    pub parallel: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            task: Task::Detect,
            score_threshold: 0.45,
            iou_threshold: 0.35,
            max_candidates: 50,
            num_classes: 80,
            num_keypoints: NUM_COCO_KEYPOINTS,
            class_agnostic: false,
            parallel: false,
        }
    }
}

impl PipelineConfig {
    /// Checks threshold ranges and layout sizes.
    pub fn validate(&self) -> YoloPostResult<()> {
        if !(0.0..=1.0).contains(&self.score_threshold) {
            return Err(YoloPostError::InvalidConfig {
                reason: "score_threshold must be within [0, 1]",
            });
        }
        if !(0.0..=1.0).contains(&self.iou_threshold) {
            return Err(YoloPostError::InvalidConfig {
                reason: "iou_threshold must be within [0, 1]",
            });
        }
        if self.max_candidates == 0 {
            return Err(YoloPostError::InvalidConfig {
                reason: "max_candidates must be at least 1",
            });
        }
        if self.num_classes == 0 {
            return Err(YoloPostError::InvalidConfig {
                reason: "num_classes must be at least 1",
            });
        }
        if self.num_keypoints == 0 {
            return Err(YoloPostError::InvalidConfig {
                reason: "num_keypoints must be at least 1",
            });
        }
        Ok(())
    }

    /// Channel count the configured task expects.
    pub fn expected_channels(&self) -> YoloPostResult<usize> {
        match self.task {
            Task::Detect => DetectView::expected_channels(self.num_classes),
            Task::Pose => PoseView::expected_channels(self.num_keypoints),
            Task::Segment => Err(YoloPostError::UnsupportedTask {
                task: Task::Segment.as_str(),
            }),
        }
    }

    fn gate(&self) -> GateParams {
        GateParams {
            score_threshold: self.score_threshold,
            max_candidates: self.max_candidates,
        }
    }
}

/// Suppressed predictions in descending score order.
#[derive(Clone, Debug, PartialEq)]
pub enum Predictions {
    Detect(Vec<Detection>),
    Pose(Vec<Pose>),
}

impl Predictions {
    pub fn task(&self) -> Task {
        match self {
            Predictions::Detect(_) => Task::Detect,
            Predictions::Pose(_) => Task::Pose,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Predictions::Detect(items) => items.len(),
            Predictions::Pose(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Boxes in output order.
    pub fn boxes(&self) -> Vec<BBox> {
        match self {
            Predictions::Detect(items) => items.iter().map(|d| d.bbox).collect(),
            Predictions::Pose(items) => items.iter().map(|p| p.bbox).collect(),
        }
    }

    /// Scores in output order.
    pub fn scores(&self) -> Vec<f32> {
        match self {
            Predictions::Detect(items) => items.iter().map(|d| d.score).collect(),
            Predictions::Pose(items) => items.iter().map(|p| p.score).collect(),
        }
    }

    pub fn as_detections(&self) -> Option<&[Detection]> {
        match self {
            Predictions::Detect(items) => Some(items),
            Predictions::Pose(_) => None,
        }
    }

    pub fn as_poses(&self) -> Option<&[Pose]> {
        match self {
            Predictions::Pose(items) => Some(items),
            Predictions::Detect(_) => None,
        }
    }
}

/// Moves the items at `keep` out of `items`, in `keep` order.
fn gather<T>(items: Vec<T>, keep: &[usize]) -> Vec<T> {
    let mut slots: Vec<Option<T>> = items.into_iter().map(Some).collect();
    keep.iter().filter_map(|&i| slots.get_mut(i)?.take()).collect()
}

fn decode_detect_head(
    view: &DetectView<'_>,
    scale: ScaleFactors,
    cfg: &PipelineConfig,
) -> Vec<Detection> {
    #[cfg(feature = "rayon")]
    if cfg.parallel {
        return crate::decode::rayon::decode_detections_par(view, scale, cfg.gate());
    }
    decode_detections(view, scale, cfg.gate())
}

fn decode_pose_head(view: &PoseView<'_>, scale: ScaleFactors, cfg: &PipelineConfig) -> Vec<Pose> {
    #[cfg(feature = "rayon")]
    if cfg.parallel {
        return crate::decode::rayon::decode_poses_par(view, scale, cfg.gate());
    }
    decode_poses(view, scale, cfg.gate())
}

/// Decodes `tensor` for `cfg.task` and returns the suppressed predictions.
///
/// Malformed shapes and invalid configuration fail before any decoding. A
/// frame where nothing passes the score gate returns an empty result.
pub fn decode_and_suppress(
    tensor: TensorView<'_>,
    scale: ScaleFactors,
    cfg: &PipelineConfig,
) -> YoloPostResult<Predictions> {
    cfg.validate()?;
    scale.validate()?;
    let _span = trace_span!(
        "decode_and_suppress",
        task = cfg.task.as_str(),
        candidates = tensor.num_candidates()
    )
    .entered();

    let predictions = match cfg.task {
        Task::Detect => {
            let view = DetectView::new(tensor, cfg.num_classes)?;
            let detections = decode_detect_head(&view, scale, cfg);
            let boxes: Vec<BBox> = detections.iter().map(|d| d.bbox).collect();
            let scores: Vec<f32> = detections.iter().map(|d| d.score).collect();
            let keep = if cfg.class_agnostic {
                nms(&boxes, &scores, cfg.iou_threshold)?
            } else {
                let classes: Vec<usize> = detections.iter().map(|d| d.class_index).collect();
                nms_grouped(&boxes, &scores, &classes, cfg.iou_threshold)?
            };
            Predictions::Detect(gather(detections, &keep))
        }
        Task::Pose => {
            let view = PoseView::new(tensor, cfg.num_keypoints)?;
            let poses = decode_pose_head(&view, scale, cfg);
            let boxes: Vec<BBox> = poses.iter().map(|p| p.bbox).collect();
            let scores: Vec<f32> = poses.iter().map(|p| p.score).collect();
            let keep = nms(&boxes, &scores, cfg.iou_threshold)?;
            Predictions::Pose(gather(poses, &keep))
        }
        Task::Segment => {
            return Err(YoloPostError::UnsupportedTask {
                task: Task::Segment.as_str(),
            })
        }
    };

    trace_event!("predictions", count = predictions.len());
    Ok(predictions)
}
