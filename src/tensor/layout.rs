//! Typed layout views for detection and pose heads.

use crate::tensor::TensorView;
use crate::util::{YoloPostError, YoloPostResult};

/// Number of box channels shared by both heads: center x, center y, width, height.
pub const NUM_BBOX_ATTRS: usize = 4;

/// Channels per keypoint: x, y, score.
pub const KEYPOINT_DIMS: usize = 3;

/// Box attribute channels in network order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BboxAttr {
    CenterX = 0,
    CenterY = 1,
    Width = 2,
    Height = 3,
}

/// Per-keypoint attribute channels in network order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeypointAttr {
    X = 0,
    Y = 1,
    Score = 2,
}

fn split_bbox<'a>(tensor: &TensorView<'a>) -> Option<[&'a [f32]; NUM_BBOX_ATTRS]> {
    Some([
        tensor.channel(BboxAttr::CenterX as usize)?,
        tensor.channel(BboxAttr::CenterY as usize)?,
        tensor.channel(BboxAttr::Width as usize)?,
        tensor.channel(BboxAttr::Height as usize)?,
    ])
}

/// Detection head: `[4 box channels][num_classes score channels]`.
#[derive(Copy, Clone, Debug)]
pub struct DetectView<'a> {
    bbox: [&'a [f32]; NUM_BBOX_ATTRS],
    scores: &'a [f32],
    num_classes: usize,
    num_candidates: usize,
}

impl<'a> DetectView<'a> {
    /// Number of channels a detection head with `num_classes` classes has.
    pub fn expected_channels(num_classes: usize) -> YoloPostResult<usize> {
        NUM_BBOX_ATTRS
            .checked_add(num_classes)
            .ok_or(YoloPostError::InvalidConfig {
                reason: "num_classes overflows the channel count",
            })
    }

    /// Validates the tensor against the detection layout.
    pub fn new(tensor: TensorView<'a>, num_classes: usize) -> YoloPostResult<Self> {
        if num_classes == 0 {
            return Err(YoloPostError::InvalidConfig {
                reason: "num_classes must be at least 1",
            });
        }
        let expected = Self::expected_channels(num_classes)?;
        if tensor.channels() != expected {
            return Err(YoloPostError::ChannelMismatch {
                task: "detect",
                expected,
                got: tensor.channels(),
            });
        }
        let shape = tensor.shape();
        let bbox = split_bbox(&tensor).ok_or(YoloPostError::InvalidShape { shape })?;
        let scores = tensor
            .channels_range(NUM_BBOX_ATTRS, num_classes)
            .ok_or(YoloPostError::InvalidShape { shape })?;
        Ok(Self {
            bbox,
            scores,
            num_classes,
            num_candidates: tensor.num_candidates(),
        })
    }

    pub fn num_candidates(&self) -> usize {
        self.num_candidates
    }

    pub fn num_classes(&self) -> usize {
        self.num_classes
    }

    /// Returns the full channel for one box attribute.
    pub fn bbox_channel(&self, attr: BboxAttr) -> &'a [f32] {
        self.bbox[attr as usize]
    }

    /// Returns the score channel of class `class`.
    pub fn class_channel(&self, class: usize) -> Option<&'a [f32]> {
        if class >= self.num_classes {
            return None;
        }
        let start = class * self.num_candidates;
        self.scores.get(start..start + self.num_candidates)
    }

    /// Returns one box attribute of candidate `i`.
    pub fn bbox_attr(&self, i: usize, attr: BboxAttr) -> Option<f32> {
        self.bbox_channel(attr).get(i).copied()
    }

    /// Returns the score of class `class` for candidate `i`.
    pub fn class_score(&self, i: usize, class: usize) -> Option<f32> {
        self.class_channel(class)?.get(i).copied()
    }

    /// Iterates the class score channels in class order.
    pub(crate) fn class_channels(&self) -> impl Iterator<Item = &'a [f32]> + '_ {
        // chunks_exact panics on zero; an empty view has no rows to visit anyway.
        let chunk = self.num_candidates.max(1);
        self.scores.chunks_exact(chunk).take(self.num_classes)
    }
}

/// Pose head: `[4 box channels][1 score channel][num_keypoints x 3 channels]`.
#[derive(Copy, Clone, Debug)]
pub struct PoseView<'a> {
    bbox: [&'a [f32]; NUM_BBOX_ATTRS],
    score: &'a [f32],
    keypoints: &'a [f32],
    num_keypoints: usize,
    num_candidates: usize,
}

impl<'a> PoseView<'a> {
    /// Channel index of the person confidence.
    pub const SCORE_CHANNEL: usize = NUM_BBOX_ATTRS;

    /// Number of channels a pose head with `num_keypoints` keypoints has.
    pub fn expected_channels(num_keypoints: usize) -> YoloPostResult<usize> {
        num_keypoints
            .checked_mul(KEYPOINT_DIMS)
            .and_then(|kp| kp.checked_add(Self::SCORE_CHANNEL + 1))
            .ok_or(YoloPostError::InvalidConfig {
                reason: "num_keypoints overflows the channel count",
            })
    }

    /// Validates the tensor against the pose layout.
    pub fn new(tensor: TensorView<'a>, num_keypoints: usize) -> YoloPostResult<Self> {
        let expected = Self::expected_channels(num_keypoints)?;
        if tensor.channels() != expected {
            return Err(YoloPostError::ChannelMismatch {
                task: "pose",
                expected,
                got: tensor.channels(),
            });
        }
        let shape = tensor.shape();
        let bbox = split_bbox(&tensor).ok_or(YoloPostError::InvalidShape { shape })?;
        let score = tensor
            .channel(Self::SCORE_CHANNEL)
            .ok_or(YoloPostError::InvalidShape { shape })?;
        let keypoints = tensor
            .channels_range(Self::SCORE_CHANNEL + 1, expected - Self::SCORE_CHANNEL - 1)
            .ok_or(YoloPostError::InvalidShape { shape })?;
        Ok(Self {
            bbox,
            score,
            keypoints,
            num_keypoints,
            num_candidates: tensor.num_candidates(),
        })
    }

    pub fn num_candidates(&self) -> usize {
        self.num_candidates
    }

    pub fn num_keypoints(&self) -> usize {
        self.num_keypoints
    }

    /// Returns the full channel for one box attribute.
    pub fn bbox_channel(&self, attr: BboxAttr) -> &'a [f32] {
        self.bbox[attr as usize]
    }

    /// Returns the person confidence channel.
    pub fn score_channel(&self) -> &'a [f32] {
        self.score
    }

    /// Returns the channel holding `attr` of keypoint `kp`.
    pub fn keypoint_channel(&self, kp: usize, attr: KeypointAttr) -> Option<&'a [f32]> {
        if kp >= self.num_keypoints {
            return None;
        }
        let channel = kp * KEYPOINT_DIMS + attr as usize;
        let start = channel * self.num_candidates;
        self.keypoints.get(start..start + self.num_candidates)
    }

    /// Returns one box attribute of candidate `i`.
    pub fn bbox_attr(&self, i: usize, attr: BboxAttr) -> Option<f32> {
        self.bbox_channel(attr).get(i).copied()
    }

    /// Returns the person confidence of candidate `i`.
    pub fn score(&self, i: usize) -> Option<f32> {
        self.score.get(i).copied()
    }

    /// Returns `attr` of keypoint `kp` for candidate `i`.
    pub fn keypoint_attr(&self, i: usize, kp: usize, attr: KeypointAttr) -> Option<f32> {
        self.keypoint_channel(kp, attr)?.get(i).copied()
    }
}
