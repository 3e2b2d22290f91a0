use ndarray::{Array2, Array3, Axis};
use tracing::debug;

use crate::consts::DISPLAY_MAX_LEVEL;
use crate::error::{BeamviewError, Result};
use crate::frame::DisplayFrame;

/// Maps averaged frames through a linear window to 8-bit RGB.
#[derive(Clone, Debug, Default)]
pub struct DisplayScaler {
    subtract_background: bool,
}

impl DisplayScaler {
    pub fn new(subtract_background: bool) -> Self {
        Self {
            subtract_background,
        }
    }

    pub fn subtract_background(&self) -> bool {
        self.subtract_background
    }

    pub fn set_subtract_background(&mut self, enabled: bool) {
        self.subtract_background = enabled;
    }

    /// Render `avg` (minus `subtract` when background subtraction is on)
    /// so that `min_val` maps to 0 and `max_val` to 255.
    pub fn render(
        &self,
        avg: &Array2<f64>,
        min_val: f64,
        max_val: f64,
        subtract: Option<&Array2<f64>>,
    ) -> Result<DisplayFrame> {
        let range = max_val - min_val;
        if range == 0.0 || !range.is_finite() {
            return Err(BeamviewError::DegenerateRange {
                min: min_val,
                max: max_val,
            });
        }

        let src = match subtract.filter(|_| self.subtract_background) {
            Some(background) => {
                if background.dim() != avg.dim() {
                    return Err(BeamviewError::ShapeMismatch {
                        expected: avg.dim(),
                        actual: background.dim(),
                    });
                }
                debug!("Subtracting background");
                avg - background
            }
            None => avg.clone(),
        };

        let gray = src.mapv(|v| to_level(v, min_val, range));
        Ok(gray_to_rgb(&gray))
    }
}

fn to_level(v: f64, min_val: f64, range: f64) -> u8 {
    ((v - min_val) * DISPLAY_MAX_LEVEL / range).clamp(0.0, DISPLAY_MAX_LEVEL) as u8
}

/// Replicate a single channel into three.
pub fn gray_to_rgb(gray: &Array2<u8>) -> DisplayFrame {
    let (h, w) = gray.dim();
    let rgb = gray
        .view()
        .insert_axis(Axis(2))
        .broadcast((h, w, 3))
        .map(|view| view.to_owned())
        .unwrap_or_else(|| Array3::zeros((h, w, 3)));
    DisplayFrame::new(rgb)
}
