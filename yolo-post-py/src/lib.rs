//! Python bindings for the yolo-post decoding pipeline.
//!
//! The network output is passed as a contiguous `float32` array of shape
//! `(1, channels, candidates)`; results come back as plain Python objects.

use numpy::{PyReadonlyArray1, PyReadonlyArray2, PyReadonlyArray3, PyUntypedArrayMethods};
use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;

use yolo_post::{
    coco_label, BBox, Detection as RustDetection, Keypoint as RustKeypoint,
    PipelineConfig as RustPipelineConfig, Pose as RustPose, Predictions as RustPredictions,
    ScaleFactors, TensorView, YoloPostError, KEYPOINT_VISIBILITY_THRESHOLD,
};

/// Convert a YoloPostError to a Python exception.
fn to_py_err(err: YoloPostError) -> PyErr {
    match err {
        YoloPostError::ImageIo { .. } => PyRuntimeError::new_err(err.to_string()),
        _ => PyValueError::new_err(err.to_string()),
    }
}

type Xywh = (f32, f32, f32, f32);

fn bbox_tuple(bbox: BBox) -> Xywh {
    (bbox.x, bbox.y, bbox.width, bbox.height)
}

/// Pipeline configuration.
#[pyclass]
#[derive(Clone)]
pub struct PipelineConfig {
    inner: RustPipelineConfig,
}

#[pymethods]
impl PipelineConfig {
    /// Create a new PipelineConfig.
    ///
    /// Args:
    ///     task: "detect", "pose" or "segment" (default: "detect")
    ///     score_threshold: Minimum score, exclusive (default: 0.45)
    ///     iou_threshold: Suppression IoU, inclusive (default: 0.35)
    ///     max_candidates: Decoder cap (default: 50)
    ///     num_classes: Class channels in a detect head (default: 80)
    ///     num_keypoints: Keypoints in a pose head (default: 17)
    ///     class_agnostic: Suppress across classes (default: False)
    ///     parallel: Decode with rayon (default: False)
    #[new]
    #[pyo3(signature = (
        task = "detect",
        score_threshold = 0.45,
        iou_threshold = 0.35,
        max_candidates = 50,
        num_classes = 80,
        num_keypoints = 17,
        class_agnostic = false,
        parallel = false
    ))]
    #[allow(clippy::too_many_arguments)]
    fn new(
        task: &str,
        score_threshold: f32,
        iou_threshold: f32,
        max_candidates: usize,
        num_classes: usize,
        num_keypoints: usize,
        class_agnostic: bool,
        parallel: bool,
    ) -> PyResult<Self> {
        let inner = RustPipelineConfig {
            task: task.parse().map_err(to_py_err)?,
            score_threshold,
            iou_threshold,
            max_candidates,
            num_classes,
            num_keypoints,
            class_agnostic,
            parallel,
        };
        inner.validate().map_err(to_py_err)?;
        Ok(Self { inner })
    }

    #[getter]
    fn task(&self) -> &'static str {
        self.inner.task.as_str()
    }

    #[getter]
    fn score_threshold(&self) -> f32 {
        self.inner.score_threshold
    }

    #[getter]
    fn iou_threshold(&self) -> f32 {
        self.inner.iou_threshold
    }

    #[getter]
    fn max_candidates(&self) -> usize {
        self.inner.max_candidates
    }

    /// Channel count the configured task expects.
    fn expected_channels(&self) -> PyResult<usize> {
        self.inner.expected_channels().map_err(to_py_err)
    }

    fn __repr__(&self) -> String {
        format!(
            "PipelineConfig(task='{}', score_threshold={}, iou_threshold={}, max_candidates={})",
            self.inner.task,
            self.inner.score_threshold,
            self.inner.iou_threshold,
            self.inner.max_candidates
        )
    }
}

/// A detection in source-image pixels.
#[pyclass]
#[derive(Clone)]
pub struct Detection {
    /// Top-left corner and size: (x, y, width, height).
    #[pyo3(get)]
    pub bbox: Xywh,
    #[pyo3(get)]
    pub class_index: usize,
    /// COCO name of the class, if the index is in range.
    #[pyo3(get)]
    pub label: Option<String>,
    #[pyo3(get)]
    pub score: f32,
}

#[pymethods]
impl Detection {
    fn __repr__(&self) -> String {
        format!(
            "Detection(bbox=({:.1}, {:.1}, {:.1}, {:.1}), class_index={}, score={:.4})",
            self.bbox.0, self.bbox.1, self.bbox.2, self.bbox.3, self.class_index, self.score
        )
    }
}

impl From<&RustDetection> for Detection {
    fn from(d: &RustDetection) -> Self {
        Self {
            bbox: bbox_tuple(d.bbox),
            class_index: d.class_index,
            label: coco_label(d.class_index).map(str::to_string),
            score: d.score,
        }
    }
}

/// A keypoint in source-image pixels with its raw score.
#[pyclass]
#[derive(Clone)]
pub struct Keypoint {
    #[pyo3(get)]
    pub x: f32,
    #[pyo3(get)]
    pub y: f32,
    #[pyo3(get)]
    pub score: f32,
}

#[pymethods]
impl Keypoint {
    fn __repr__(&self) -> String {
        format!(
            "Keypoint(x={:.1}, y={:.1}, score={:.3})",
            self.x, self.y, self.score
        )
    }
}

impl From<&RustKeypoint> for Keypoint {
    fn from(kp: &RustKeypoint) -> Self {
        Self {
            x: kp.x,
            y: kp.y,
            score: kp.score,
        }
    }
}

/// A person with keypoints in network order.
#[pyclass]
#[derive(Clone)]
pub struct Pose {
    inner: RustPose,
}

#[pymethods]
impl Pose {
    #[getter]
    fn bbox(&self) -> Xywh {
        bbox_tuple(self.inner.bbox)
    }

    #[getter]
    fn score(&self) -> f32 {
        self.inner.score
    }

    #[getter]
    fn keypoints(&self) -> Vec<Keypoint> {
        self.inner.keypoints.iter().map(Keypoint::from).collect()
    }

    /// Skeleton limbs whose endpoints both score above `threshold`.
    #[pyo3(signature = (threshold = KEYPOINT_VISIBILITY_THRESHOLD))]
    fn visible_limbs(&self, threshold: f32) -> Vec<(usize, usize)> {
        self.inner.visible_limbs(threshold).collect()
    }

    fn __repr__(&self) -> String {
        format!(
            "Pose(score={:.4}, keypoints={})",
            self.inner.score,
            self.inner.keypoints.len()
        )
    }
}

/// Suppressed predictions in descending score order.
#[pyclass]
pub struct Predictions {
    inner: RustPredictions,
}

#[pymethods]
impl Predictions {
    #[getter]
    fn task(&self) -> &'static str {
        self.inner.task().as_str()
    }

    /// Detections, or an empty list for pose output.
    fn detections(&self) -> Vec<Detection> {
        self.inner
            .as_detections()
            .map(|items| items.iter().map(Detection::from).collect())
            .unwrap_or_default()
    }

    /// Poses, or an empty list for detection output.
    fn poses(&self) -> Vec<Pose> {
        self.inner
            .as_poses()
            .map(|items| {
                items
                    .iter()
                    .map(|p| Pose { inner: p.clone() })
                    .collect()
            })
            .unwrap_or_default()
    }

    fn __len__(&self) -> usize {
        self.inner.len()
    }

    fn __repr__(&self) -> String {
        format!("Predictions(task='{}', len={})", self.task(), self.inner.len())
    }
}

/// Decode a raw head tensor and suppress overlapping predictions.
///
/// Args:
///     output: float32 array of shape (1, channels, candidates), C-contiguous
///     x_ratio: source width / network input width (default: 1.0)
///     y_ratio: source height / network input height (default: 1.0)
///     config: PipelineConfig (default: PipelineConfig())
#[pyfunction]
#[pyo3(signature = (output, x_ratio = 1.0, y_ratio = 1.0, config = None))]
fn decode_and_suppress(
    output: PyReadonlyArray3<'_, f32>,
    x_ratio: f32,
    y_ratio: f32,
    config: Option<PipelineConfig>,
) -> PyResult<Predictions> {
    let shape = output.shape();
    let shape = [shape[0], shape[1], shape[2]];
    let data = output.as_slice()?;
    let tensor = TensorView::new(data, shape).map_err(to_py_err)?;
    let scale = ScaleFactors::new(x_ratio, y_ratio).map_err(to_py_err)?;
    let cfg = config.map(|c| c.inner).unwrap_or_default();
    let inner = yolo_post::decode_and_suppress(tensor, scale, &cfg).map_err(to_py_err)?;
    Ok(Predictions { inner })
}

/// Greedy non-maximum suppression.
///
/// Args:
///     boxes: float32 array of shape (N, 4) as (x, y, width, height)
///     scores: float32 array of shape (N,)
///     iou_threshold: boxes at or above this IoU are suppressed
///     classes: optional per-box class ids; suppression then runs per class
///
/// Returns:
///     Indices of the retained boxes, best first
#[pyfunction]
#[pyo3(signature = (boxes, scores, iou_threshold = 0.35, classes = None))]
fn nms(
    boxes: PyReadonlyArray2<'_, f32>,
    scores: PyReadonlyArray1<'_, f32>,
    iou_threshold: f32,
    classes: Option<Vec<usize>>,
) -> PyResult<Vec<usize>> {
    if boxes.shape()[1] != 4 {
        return Err(PyValueError::new_err("boxes must have shape (N, 4)"));
    }
    let boxes: Vec<BBox> = boxes
        .as_slice()?
        .chunks_exact(4)
        .map(|b| BBox::new(b[0], b[1], b[2], b[3]))
        .collect();
    let scores = scores.as_slice()?;
    let keep = match classes {
        Some(classes) => yolo_post::nms_grouped(&boxes, scores, &classes, iou_threshold),
        None => yolo_post::nms(&boxes, scores, iou_threshold),
    };
    keep.map_err(to_py_err)
}

/// Intersection over union of two (x, y, width, height) boxes.
#[pyfunction]
fn iou(a: Xywh, b: Xywh) -> f32 {
    yolo_post::iou(
        &BBox::new(a.0, a.1, a.2, a.3),
        &BBox::new(b.0, b.1, b.2, b.3),
    )
}

/// Python module for YOLO head post-processing.
#[pymodule]
fn _yolo_post(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PipelineConfig>()?;
    m.add_class::<Detection>()?;
    m.add_class::<Keypoint>()?;
    m.add_class::<Pose>()?;
    m.add_class::<Predictions>()?;
    m.add_function(wrap_pyfunction!(decode_and_suppress, m)?)?;
    m.add_function(wrap_pyfunction!(nms, m)?)?;
    m.add_function(wrap_pyfunction!(iou, m)?)?;
    m.add("KEYPOINT_VISIBILITY_THRESHOLD", KEYPOINT_VISIBILITY_THRESHOLD)?;

    m.add("__version__", env!("CARGO_PKG_VERSION"))?;

    Ok(())
}
