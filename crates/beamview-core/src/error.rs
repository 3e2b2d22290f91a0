use thiserror::Error;

#[derive(Error, Debug)]
pub enum BeamviewError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image format error: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("Invalid image dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("Shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        expected: (usize, usize),
        actual: (usize, usize),
    },

    #[error("Degenerate display range: min {min} and max {max} do not span a window")]
    DegenerateRange { min: f64, max: f64 },

    #[error("Unknown register: {0}")]
    UnknownRegister(String),

    #[error("Register {0} has not been read from the device yet")]
    RegisterUnknown(String),

    #[error("Invalid calibration (scale {scale}, offset {offset}): {reason}")]
    InvalidCalibration {
        scale: f64,
        offset: f64,
        reason: String,
    },

    #[error("Device error: {0}")]
    Device(String),

    #[error("Not connected to a device")]
    NotConnected,

    #[error("Unknown frame processor: {0}")]
    UnknownProcessor(String),

    #[error("Invalid timestamp log: {0}")]
    InvalidTimestampLog(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, BeamviewError>;
