//! Box geometry, overlap and coordinate scaling.
//!
//! Boxes use the renderer's convention: top-left corner plus size, in source
//! image pixels with the origin at the top-left of the image.

use crate::util::{YoloPostError, YoloPostResult};

/// Axis-aligned rectangle given as top-left corner and size.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl BBox {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Builds a box from its center and size.
    pub fn from_center(cx: f32, cy: f32, width: f32, height: f32) -> Self {
        Self {
            x: cx - 0.5 * width,
            y: cy - 0.5 * height,
            width,
            height,
        }
    }

    pub fn area(&self) -> f32 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    /// Returns `[x, y, width, height]`.
    pub fn to_array(self) -> [f32; 4] {
        [self.x, self.y, self.width, self.height]
    }

    /// Returns `[x_min, y_min, x_max, y_max]`.
    pub fn to_corners(self) -> [f32; 4] {
        [self.x, self.y, self.x + self.width, self.y + self.height]
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.width.is_finite() && self.height.is_finite()
    }
}

/// Intersection over union of two boxes; 0 when the union is empty.
pub fn iou(a: &BBox, b: &BBox) -> f32 {
    iou_with_areas(a, a.area(), b, b.area())
}

/// IoU with precomputed areas, used by the suppressor's inner loop.
#[inline]
pub(crate) fn iou_with_areas(a: &BBox, area_a: f32, b: &BBox, area_b: f32) -> f32 {
    let x1 = a.x.max(b.x);
    let y1 = a.y.max(b.y);
    let x2 = (a.x + a.width).min(b.x + b.width);
    let y2 = (a.y + a.height).min(b.y + b.height);

    let intersection = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
    let union = area_a + area_b - intersection;
    if union > 0.0 {
        intersection / union
    } else {
        0.0
    }
}

/// Multipliers from network-input coordinates to source-image coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScaleFactors {
    pub x_ratio: f32,
    pub y_ratio: f32,
}

impl Default for ScaleFactors {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl ScaleFactors {
    /// Network space equals source space.
    pub const IDENTITY: Self = Self {
        x_ratio: 1.0,
        y_ratio: 1.0,
    };

    /// Creates scale factors, rejecting zero, negative and non-finite ratios.
    pub fn new(x_ratio: f32, y_ratio: f32) -> YoloPostResult<Self> {
        let scale = Self { x_ratio, y_ratio };
        scale.validate()?;
        Ok(scale)
    }

    /// Derives ratios from the source image size and the network input size
    /// the image was resized to.
    pub fn from_dims(
        source_width: u32,
        source_height: u32,
        input_width: u32,
        input_height: u32,
    ) -> YoloPostResult<Self> {
        if input_width == 0 || input_height == 0 {
            return Err(YoloPostError::InvalidConfig {
                reason: "network input dimensions must be non-zero",
            });
        }
        Self::new(
            source_width as f32 / input_width as f32,
            source_height as f32 / input_height as f32,
        )
    }

    pub fn validate(&self) -> YoloPostResult<()> {
        let ok = |r: f32| r.is_finite() && r > 0.0;
        if !ok(self.x_ratio) || !ok(self.y_ratio) {
            return Err(YoloPostError::InvalidScale {
                x_ratio: self.x_ratio,
                y_ratio: self.y_ratio,
            });
        }
        Ok(())
    }

    /// Maps a network-space center/size box to a source-space corner box.
    ///
    /// Negative sizes are clamped to zero.
    #[inline]
    pub fn scale_center_box(&self, cx: f32, cy: f32, w: f32, h: f32) -> BBox {
        let width = (w * self.x_ratio).max(0.0);
        let height = (h * self.y_ratio).max(0.0);
        BBox {
            x: cx * self.x_ratio - 0.5 * width,
            y: cy * self.y_ratio - 0.5 * height,
            width,
            height,
        }
    }

    /// Maps a network-space point to source space.
    #[inline]
    pub fn scale_point(&self, x: f32, y: f32) -> (f32, f32) {
        (x * self.x_ratio, y * self.y_ratio)
    }
}
