use std::borrow::Cow;

use ndarray::{s, Array2};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::frame::{Frame, FrameData};

use super::window::WindowFunctionCache;

/// Circular region of interest with a tapered edge, in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoiParams {
    pub center_x: i64,
    pub center_y: i64,
    pub radius: f64,
    pub taper: f64,
}

impl RoiParams {
    /// Negative radius or taper is treated as zero.
    pub fn new(center_x: i64, center_y: i64, radius: f64, taper: f64) -> Self {
        Self {
            center_x,
            center_y,
            radius: radius.max(0.0),
            taper: taper.max(0.0),
        }
    }

    /// `round(radius + taper)`, halves to even: half-size of the square
    /// enclosing the mask. Saturates at `i64::MAX`.
    pub fn full_radius(&self) -> i64 {
        (self.radius.max(0.0) + self.taper.max(0.0)).round_ties_even() as i64
    }

    /// Bounding box clamped to a `(height, width)` frame, or `None` if the
    /// clamped box is empty.
    pub fn bounding_box(&self, shape: (usize, usize)) -> Option<RoiBox> {
        let (h, w) = shape;
        if h == 0 || w == 0 {
            return None;
        }
        let fr = self.full_radius();
        let (ymin, ymax) = clamp_span(
            self.center_y.saturating_sub(fr),
            self.center_y.saturating_add(fr),
            h,
        );
        let (xmin, xmax) = clamp_span(
            self.center_x.saturating_sub(fr),
            self.center_x.saturating_add(fr),
            w,
        );

        let roi_box = RoiBox {
            ymin,
            ymax,
            xmin,
            xmax,
        };
        (!roi_box.is_empty()).then_some(roi_box)
    }
}

fn clamp_span(lo: i64, hi: i64, len: usize) -> (usize, usize) {
    let last = len as i64 - 1;
    (lo.clamp(0, last) as usize, hi.clamp(0, last) as usize)
}

/// Half-open pixel box: rows `ymin..ymax`, columns `xmin..xmax`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RoiBox {
    pub ymin: usize,
    pub ymax: usize,
    pub xmin: usize,
    pub xmax: usize,
}

impl RoiBox {
    pub fn height(&self) -> usize {
        self.ymax.saturating_sub(self.ymin)
    }

    pub fn width(&self) -> usize {
        self.xmax.saturating_sub(self.xmin)
    }

    pub fn is_empty(&self) -> bool {
        self.height() == 0 || self.width() == 0
    }
}

/// Crops frames to the ROI and applies the tapered window.
#[derive(Debug, Default)]
pub struct RoiExtractor {
    cache: WindowFunctionCache,
}

impl RoiExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// With no ROI, or an ROI whose clamped box is empty, the input frame
    /// is returned untouched. Otherwise the windowed crop is returned as a
    /// float frame the size of the clamped box.
    pub fn apply<'a>(&mut self, frame: &'a Frame, roi: Option<&RoiParams>) -> Cow<'a, Frame> {
        let Some(roi) = roi else {
            return Cow::Borrowed(frame);
        };
        let Some(b) = roi.bounding_box(frame.dim()) else {
            debug!(?roi, shape = ?frame.dim(), "ROI outside frame, passing through");
            return Cow::Borrowed(frame);
        };

        let mask = self.cache.get(
            roi.center_y,
            b.ymin,
            b.ymax,
            roi.center_x,
            b.xmin,
            b.xmax,
            roi.radius,
            roi.taper,
        );

        let window = s![b.ymin..b.ymax, b.xmin..b.xmax];
        let cropped: Array2<f64> = match &frame.data {
            FrameData::Raw(a) => a.slice(window).mapv(|v| v as f64) * mask,
            FrameData::Float(a) => &a.slice(window) * mask,
        };

        Cow::Owned(
            Frame::float(cropped, frame.bit_depth).with_metadata(frame.metadata.clone()),
        )
    }
}
