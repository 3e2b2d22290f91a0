use std::f64::consts::PI;

use ndarray::{Array2, ArrayView1};
use rayon::prelude::*;
use tracing::debug;

use crate::consts::PARALLEL_PIXEL_THRESHOLD;

/// The tuple that fully determines a window mask.
#[derive(Clone, Copy, Debug, PartialEq)]
struct WindowKey {
    ycenter: i64,
    ymin: usize,
    ymax: usize,
    xcenter: i64,
    xmin: usize,
    xmax: usize,
    radius: f64,
    taper: f64,
}

/// Memoizes the most recent tapered circular mask.
///
/// Only one mask is kept: a call with a different tuple replaces it.
#[derive(Debug, Default)]
pub struct WindowFunctionCache {
    key: Option<WindowKey>,
    mask: Array2<f64>,
}

impl WindowFunctionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mask over rows `ymin..ymax` and columns `xmin..xmax`, centered on
    /// `(ycenter, xcenter)` in full-frame coordinates.
    #[allow(clippy::too_many_arguments)]
    pub fn get(
        &mut self,
        ycenter: i64,
        ymin: usize,
        ymax: usize,
        xcenter: i64,
        xmin: usize,
        xmax: usize,
        radius: f64,
        taper: f64,
    ) -> &Array2<f64> {
        let key = WindowKey {
            ycenter,
            ymin,
            ymax,
            xcenter,
            xmin,
            xmax,
            radius,
            taper,
        };
        if self.key != Some(key) {
            debug!(?key, "Recomputing window mask");
            self.mask = window_mask(ycenter, ymin, ymax, xcenter, xmin, xmax, radius, taper);
            self.key = Some(key);
        }
        &self.mask
    }
}

/// Raised-cosine weight at distance `d` from the center: 1 inside
/// `radius`, falling to 0 across `taper`, 0 beyond.
pub fn taper_weight(d: f64, radius: f64, taper: f64) -> f64 {
    if d < radius {
        1.0
    } else if taper > 0.0 && d <= radius + taper {
        0.5 * (1.0 + (PI * (d - radius) / taper).cos())
    } else {
        0.0
    }
}

/// Compute a tapered circular mask over a bounding box.
#[allow(clippy::too_many_arguments)]
pub fn window_mask(
    ycenter: i64,
    ymin: usize,
    ymax: usize,
    xcenter: i64,
    xmin: usize,
    xmax: usize,
    radius: f64,
    taper: f64,
) -> Array2<f64> {
    let h = ymax.saturating_sub(ymin);
    let w = xmax.saturating_sub(xmin);

    let row_weights = |row: usize| -> Vec<f64> {
        let dy = (ymin + row) as f64 - ycenter as f64;
        (0..w)
            .map(|col| {
                let dx = (xmin + col) as f64 - xcenter as f64;
                taper_weight((dx * dx + dy * dy).sqrt(), radius, taper)
            })
            .collect()
    };

    let mut mask = Array2::<f64>::zeros((h, w));
    if h * w >= PARALLEL_PIXEL_THRESHOLD {
        let rows: Vec<Vec<f64>> = (0..h).into_par_iter().map(row_weights).collect();
        for (row, weights) in rows.iter().enumerate() {
            mask.row_mut(row).assign(&ArrayView1::from(weights.as_slice()));
        }
    } else {
        for row in 0..h {
            let weights = row_weights(row);
            mask.row_mut(row).assign(&ArrayView1::from(weights.as_slice()));
        }
    }
    mask
}
