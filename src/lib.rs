//! yolo-post decodes YOLO-style detection and pose heads into suppressed,
//! pixel-space predictions.
//!
//! The input is the flat channel-major output tensor of the network plus the
//! ratios between the source image and the network input. The output is a
//! bounded list of boxes (with class or keypoints) in descending score order,
//! ready for an overlay renderer. Optional features add rayon-parallel
//! decoding (`rayon`), an 8-lane arg-max (`simd`), structured spans
//! (`tracing`) and source-image size probing (`image-io`).

pub mod decode;
pub mod geometry;
#[cfg(feature = "image-io")]
pub mod io;
pub mod labels;
pub mod lowlevel;
pub mod pipeline;
pub mod skeleton;
mod suppress;
pub mod tensor;
mod trace;
pub mod util;

pub use decode::{Detection, Keypoint, Pose};
pub use geometry::{iou, BBox, ScaleFactors};
pub use labels::{coco_label, COCO_CLASSES};
pub use pipeline::{decode_and_suppress, PipelineConfig, Predictions, Task};
pub use skeleton::{KeypointKind, COCO_SKELETON, KEYPOINT_VISIBILITY_THRESHOLD};
pub use tensor::TensorView;
pub use util::{YoloPostError, YoloPostResult};

pub use suppress::nms::{nms, nms_grouped};
