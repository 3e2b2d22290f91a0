use ndarray::{Array2, Array3};
use num_traits::AsPrimitive;

use crate::error::{BeamviewError, Result};

/// Sample storage of a frame.
///
/// `Raw` holds the camera's native 16-bit words untouched. Anything that has
/// been transformed upstream (windowing, plugin processing) is `Float`.
#[derive(Clone, Debug, PartialEq)]
pub enum FrameData {
    Raw(Array2<u16>),
    Float(Array2<f64>),
}

impl FrameData {
    /// Shape as (height, width).
    pub fn dim(&self) -> (usize, usize) {
        match self {
            Self::Raw(a) => a.dim(),
            Self::Float(a) => a.dim(),
        }
    }

    pub fn is_raw(&self) -> bool {
        matches!(self, Self::Raw(_))
    }

    /// Widen to f64 regardless of the stored kind.
    pub fn to_f64(&self) -> Array2<f64> {
        match self {
            Self::Raw(a) => a.mapv(|v| v as f64),
            Self::Float(a) => a.clone(),
        }
    }

    /// Sum of all samples.
    pub fn sum(&self) -> f64 {
        match self {
            Self::Raw(a) => sum_samples(a),
            Self::Float(a) => sum_samples(a),
        }
    }
}

fn sum_samples<T: AsPrimitive<f64>>(data: &Array2<T>) -> f64 {
    data.iter().map(|&v| v.as_()).sum()
}

/// A single monochrome frame.
#[derive(Clone, Debug)]
pub struct Frame {
    /// Pixel data, row-major, shape = (height, width)
    pub data: FrameData,
    /// Significant bits of the raw samples (12 for the sensor, 16 for files)
    pub bit_depth: u8,
    pub metadata: FrameMetadata,
}

impl Frame {
    pub fn new(data: FrameData, bit_depth: u8) -> Self {
        Self {
            data,
            bit_depth,
            metadata: FrameMetadata::default(),
        }
    }

    pub fn raw(data: Array2<u16>, bit_depth: u8) -> Self {
        Self::new(FrameData::Raw(data), bit_depth)
    }

    pub fn float(data: Array2<f64>, bit_depth: u8) -> Self {
        Self::new(FrameData::Float(data), bit_depth)
    }

    pub fn with_metadata(mut self, metadata: FrameMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn width(&self) -> usize {
        self.data.dim().1
    }

    pub fn height(&self) -> usize {
        self.data.dim().0
    }

    pub fn dim(&self) -> (usize, usize) {
        self.data.dim()
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct FrameMetadata {
    /// Position of the frame in the acquisition session.
    pub frame_index: u64,
    /// Counter value embedded by the camera, if the source provides one.
    pub sequence: Option<u32>,
    /// Host time of arrival, seconds since the Unix epoch.
    pub host_timestamp: Option<f64>,
}

/// 8-bit RGB image ready for a display sink.
/// Shape = (height, width, 3).
#[derive(Clone, Debug, PartialEq)]
pub struct DisplayFrame {
    pub data: Array3<u8>,
}

impl DisplayFrame {
    pub fn new(data: Array3<u8>) -> Self {
        Self { data }
    }

    pub fn width(&self) -> usize {
        self.data.dim().1
    }

    pub fn height(&self) -> usize {
        self.data.dim().0
    }

    /// RGB value at (row, col).
    pub fn pixel(&self, row: usize, col: usize) -> [u8; 3] {
        [
            self.data[[row, col, 0]],
            self.data[[row, col, 1]],
            self.data[[row, col, 2]],
        ]
    }

    /// Convert to an `image` buffer for saving or handing to a renderer.
    pub fn to_rgb_image(&self) -> Result<image::RgbImage> {
        let (h, w, _) = self.data.dim();
        let pixels: Vec<u8> = self.data.as_standard_layout().iter().copied().collect();
        image::RgbImage::from_raw(w as u32, h as u32, pixels).ok_or(
            BeamviewError::InvalidDimensions {
                width: w,
                height: h,
            },
        )
    }
}
