//! Error types for yolo-post.

use thiserror::Error;

/// Result alias for yolo-post operations.
pub type YoloPostResult<T> = std::result::Result<T, YoloPostError>;

/// Errors that can occur when decoding and suppressing network outputs.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum YoloPostError {
    /// The tensor shape has a zero or overflowing dimension.
    #[error("invalid tensor shape {shape:?}")]
    InvalidShape { shape: [usize; 3] },
    /// Only a batch size of one is decoded.
    #[error("batch size {batch} is not supported, expected 1")]
    BatchNotSupported { batch: usize },
    /// The backing buffer does not cover the declared shape.
    #[error("buffer too small: needed {needed}, got {got}")]
    BufferTooSmall { needed: usize, got: usize },
    /// The channel count does not match the layout of the task.
    #[error("{task} layout expects {expected} channels, tensor has {got}")]
    ChannelMismatch {
        task: &'static str,
        expected: usize,
        got: usize,
    },
    /// Two parallel inputs disagree in length.
    #[error("{context} length mismatch: expected {expected}, got {got}")]
    LengthMismatch {
        expected: usize,
        got: usize,
        context: &'static str,
    },
    /// A score handed to the suppressor is NaN or infinite.
    #[error("score at index {index} is not finite")]
    NonFiniteScore { index: usize },
    /// Scale factors must be finite and strictly positive.
    #[error("invalid scale factors x_ratio={x_ratio}, y_ratio={y_ratio}")]
    InvalidScale { x_ratio: f32, y_ratio: f32 },
    /// A configuration field is out of range.
    #[error("invalid config: {reason}")]
    InvalidConfig { reason: &'static str },
    /// The task name is not recognized.
    #[error("unknown task: {name}")]
    UnknownTask { name: String },
    /// The task is recognized but has no decoder.
    #[error("task {task} has no decoder")]
    UnsupportedTask { task: &'static str },
    /// Image decoding failed.
    #[error("image io error: {reason}")]
    ImageIo { reason: String },
}
