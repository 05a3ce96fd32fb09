//! Building blocks below `decode_and_suppress`.
//!
//! These expose the typed head views, the score gate and the individual
//! decoders for callers that run their own suppression or merge several
//! heads. Most users should call [`crate::decode_and_suppress`].

pub use crate::decode::{decode_detections, decode_poses, GateParams};
pub use crate::tensor::layout::{KEYPOINT_DIMS, NUM_BBOX_ATTRS};
pub use crate::tensor::{BboxAttr, DetectView, KeypointAttr, PoseView};

#[cfg(feature = "rayon")]
pub use crate::decode::rayon::{decode_detections_par, decode_poses_par};
