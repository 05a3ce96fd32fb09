//! Channel-major tensor views.
//!
//! `TensorView` is a borrowed view over a flat `[1, channels, num_candidates]`
//! output buffer. All values of one channel are contiguous, so the value of
//! channel `c` for candidate `i` lives at `c * num_candidates + i`. The typed
//! layout views in [`layout`] split the buffer into named channel slices
//! without copying.

use crate::util::{YoloPostError, YoloPostResult};

pub mod layout;

pub use layout::{BboxAttr, DetectView, KeypointAttr, PoseView};

/// Borrowed channel-major view of a single-batch network output.
#[derive(Copy, Clone, Debug)]
pub struct TensorView<'a> {
    data: &'a [f32],
    channels: usize,
    num_candidates: usize,
}

impl<'a> TensorView<'a> {
    /// Creates a view from a buffer and its declared `[batch, channels, candidates]` shape.
    ///
    /// The batch dimension must be 1 and the buffer length must equal the
    /// product of the shape.
    pub fn new(data: &'a [f32], shape: [usize; 3]) -> YoloPostResult<Self> {
        let [batch, channels, num_candidates] = shape;
        if batch == 0 || channels == 0 {
            return Err(YoloPostError::InvalidShape { shape });
        }
        if batch != 1 {
            return Err(YoloPostError::BatchNotSupported { batch });
        }
        Self::from_channels(data, channels, num_candidates)
    }

    /// Creates a view from a buffer holding `channels` rows of `num_candidates` values.
    pub fn from_channels(
        data: &'a [f32],
        channels: usize,
        num_candidates: usize,
    ) -> YoloPostResult<Self> {
        let shape = [1, channels, num_candidates];
        if channels == 0 {
            return Err(YoloPostError::InvalidShape { shape });
        }
        let needed = channels
            .checked_mul(num_candidates)
            .ok_or(YoloPostError::InvalidShape { shape })?;
        if data.len() < needed {
            return Err(YoloPostError::BufferTooSmall {
                needed,
                got: data.len(),
            });
        }
        if data.len() > needed {
            return Err(YoloPostError::LengthMismatch {
                expected: needed,
                got: data.len(),
                context: "tensor data",
            });
        }
        Ok(Self {
            data,
            channels,
            num_candidates,
        })
    }

    /// Returns the shape as `[1, channels, num_candidates]`.
    pub fn shape(&self) -> [usize; 3] {
        [1, self.channels, self.num_candidates]
    }

    /// Returns the number of channels.
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Returns the number of candidates (anchor points) per channel.
    pub fn num_candidates(&self) -> usize {
        self.num_candidates
    }

    /// Returns the backing buffer.
    pub fn as_slice(&self) -> &'a [f32] {
        self.data
    }

    /// Returns the value of `channel` for `candidate` if both are in range.
    pub fn get(&self, channel: usize, candidate: usize) -> Option<f32> {
        if channel >= self.channels || candidate >= self.num_candidates {
            return None;
        }
        let idx = channel
            .checked_mul(self.num_candidates)?
            .checked_add(candidate)?;
        self.data.get(idx).copied()
    }

    /// Returns the contiguous values of one channel.
    pub fn channel(&self, channel: usize) -> Option<&'a [f32]> {
        self.channels_range(channel, 1)
    }

    /// Returns `count` consecutive channels starting at `first` as one slice.
    pub(crate) fn channels_range(&self, first: usize, count: usize) -> Option<&'a [f32]> {
        let end_channel = first.checked_add(count)?;
        if end_channel > self.channels {
            return None;
        }
        let start = first.checked_mul(self.num_candidates)?;
        let end = end_channel.checked_mul(self.num_candidates)?;
        self.data.get(start..end)
    }
}
