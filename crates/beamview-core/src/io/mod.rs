pub mod image_io;
pub mod timestamp_log;

pub use image_io::{FrameSaver, SaveFormat};
pub use timestamp_log::{TimestampLog, TimestampLogger};
