use std::path::{Path, PathBuf};

use image::{ImageFormat, Luma};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{BeamviewError, Result};
use crate::frame::DisplayFrame;

/// Load an image file as raw 16-bit samples, shape (height, width).
pub fn load_raw_image(path: &Path) -> Result<Array2<u16>> {
    let img = image::open(path)?;
    let gray = img.to_luma16();
    let (w, h) = gray.dimensions();
    Array2::from_shape_vec((h as usize, w as usize), gray.into_raw()).map_err(|_| {
        BeamviewError::InvalidDimensions {
            width: w as usize,
            height: h as usize,
        }
    })
}

fn to_luma16(data: &Array2<f64>) -> Result<image::ImageBuffer<Luma<u16>, Vec<u16>>> {
    let (h, w) = data.dim();
    let pixels: Vec<u16> = data
        .iter()
        .map(|&v| v.round().clamp(0.0, u16::MAX as f64) as u16)
        .collect();
    image::ImageBuffer::<Luma<u16>, Vec<u16>>::from_raw(w as u32, h as u32, pixels)
        .ok_or(BeamviewError::InvalidDimensions {
            width: w,
            height: h,
        })
}

/// Save sample counts as 16-bit grayscale TIFF. Values are rounded and
/// clamped to the 16-bit range.
pub fn save_tiff16(data: &Array2<f64>, path: &Path) -> Result<()> {
    to_luma16(data)?.save_with_format(path, ImageFormat::Tiff)?;
    Ok(())
}

/// Save sample counts as 16-bit grayscale PNG.
pub fn save_png16(data: &Array2<f64>, path: &Path) -> Result<()> {
    to_luma16(data)?.save_with_format(path, ImageFormat::Png)?;
    Ok(())
}

/// Save sample counts, choosing format from file extension.
pub fn save_image16(data: &Array2<f64>, path: &Path) -> Result<()> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("png") => save_png16(data, path),
        _ => save_tiff16(data, path),
    }
}

/// Save a rendered display frame as 8-bit RGB PNG.
pub fn save_display_png(frame: &DisplayFrame, path: &Path) -> Result<()> {
    frame.to_rgb_image()?.save_with_format(path, ImageFormat::Png)?;
    Ok(())
}

/// 16-bit container used by [`FrameSaver`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaveFormat {
    #[default]
    Tiff,
    Png,
}

impl SaveFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Tiff => "tif",
            Self::Png => "png",
        }
    }
}

/// Writes averaged frames to sequentially numbered files
/// `<prefix>_000000.<ext>`, `<prefix>_000001.<ext>`, ...
#[derive(Clone, Debug)]
pub struct FrameSaver {
    dir: PathBuf,
    prefix: String,
    format: SaveFormat,
    next_index: u64,
}

impl FrameSaver {
    /// Create the output directory if needed.
    pub fn create(dir: impl Into<PathBuf>, prefix: impl Into<String>, format: SaveFormat) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            prefix: prefix.into(),
            format,
            next_index: 0,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Number of files written.
    pub fn saved(&self) -> u64 {
        self.next_index
    }

    /// Path the next frame will be written to.
    pub fn next_path(&self) -> PathBuf {
        self.dir.join(format!(
            "{}_{:06}.{}",
            self.prefix,
            self.next_index,
            self.format.extension()
        ))
    }

    pub fn save(&mut self, average: &Array2<f64>) -> Result<PathBuf> {
        let path = self.next_path();
        match self.format {
            SaveFormat::Tiff => save_tiff16(average, &path)?,
            SaveFormat::Png => save_png16(average, &path)?,
        }
        debug!(path = %path.display(), "Saved average");
        self.next_index += 1;
        Ok(path)
    }

    /// Save a rendered display frame under the next number, always as PNG.
    pub fn save_display(&mut self, frame: &DisplayFrame) -> Result<PathBuf> {
        let path = self
            .dir
            .join(format!("{}_{:06}.png", self.prefix, self.next_index));
        save_display_png(frame, &path)?;
        self.next_index += 1;
        Ok(path)
    }
}
