//! Decoders from raw head tensors to scored candidates.
//!
//! Both decoders walk candidates in ascending index order, drop anything at or
//! below the score threshold and stop once `max_candidates` have been emitted.
//! The cap bounds the cost of suppression on noisy frames; it is a
//! throughput/latency tradeoff, not a quality guarantee, because candidates
//! past the cap are never looked at even if they score higher than the ones
//! already kept.

use crate::geometry::{BBox, ScaleFactors};
use crate::tensor::BboxAttr;

pub mod detect;
pub mod pose;

#[cfg(feature = "simd")]
pub mod simd;

#[cfg(feature = "rayon")]
pub mod rayon;

pub use detect::decode_detections;
pub use pose::decode_poses;

/// Score gate applied while decoding.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GateParams {
    /// Candidates must score strictly above this value.
    pub score_threshold: f32,
    /// Maximum number of candidates emitted per call.
    pub max_candidates: usize,
}

impl GateParams {
    #[inline]
    pub(crate) fn passes(&self, score: f32) -> bool {
        score > self.score_threshold
    }
}

/// A decoded detection in source-image pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Detection {
    pub bbox: BBox,
    pub class_index: usize,
    pub score: f32,
}

/// A keypoint in source-image pixels with its raw confidence.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Keypoint {
    pub x: f32,
    pub y: f32,
    pub score: f32,
}

/// A decoded person with its keypoints in network order.
#[derive(Clone, Debug, PartialEq)]
pub struct Pose {
    pub bbox: BBox,
    pub score: f32,
    pub keypoints: Vec<Keypoint>,
}

/// The four box channels of a head, resolved once per call.
#[derive(Clone, Copy)]
pub(crate) struct BoxChannels<'a> {
    cx: &'a [f32],
    cy: &'a [f32],
    w: &'a [f32],
    h: &'a [f32],
}

impl<'a> BoxChannels<'a> {
    pub(crate) fn new(channel: impl Fn(BboxAttr) -> &'a [f32]) -> Self {
        Self {
            cx: channel(BboxAttr::CenterX),
            cy: channel(BboxAttr::CenterY),
            w: channel(BboxAttr::Width),
            h: channel(BboxAttr::Height),
        }
    }

    /// Decodes candidate `i` into source space, or `None` if the result is not finite.
    #[inline]
    pub(crate) fn decode(&self, i: usize, scale: ScaleFactors) -> Option<BBox> {
        let raw = [
            *self.cx.get(i)?,
            *self.cy.get(i)?,
            *self.w.get(i)?,
            *self.h.get(i)?,
        ];
        // f32::max would turn a NaN size into 0, so reject before scaling.
        if raw.iter().any(|v| !v.is_finite()) {
            return None;
        }
        let bbox = scale.scale_center_box(raw[0], raw[1], raw[2], raw[3]);
        bbox.is_finite().then_some(bbox)
    }
}
