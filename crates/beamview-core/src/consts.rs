use std::time::Duration;

/// Minimum pixel count (h*w) to use row-level Rayon parallelism.
pub const PARALLEL_PIXEL_THRESHOLD: usize = 65_536;

/// Bit width of the frame counter the camera embeds in every frame.
pub const SEQUENCE_BIT_WIDTH: u32 = 12;

/// Native sample depth of the sensor, stored in 16-bit words.
pub const SENSOR_BIT_DEPTH: u8 = 12;

/// Largest value a raw 16-bit sample can hold.
pub const MAX_RAW_SAMPLE: u16 = u16::MAX;

/// Default number of frames averaged before a result is displayed.
pub const DEFAULT_ACCUMULATION_TARGET: usize = 10;

/// Default lower bound of the display window, in sample counts.
pub const DEFAULT_DISPLAY_MIN: f64 = 0.0;

/// Default upper bound of the display window (full 16-bit scale).
pub const DEFAULT_DISPLAY_MAX: f64 = 65_536.0;

/// Largest value of an 8-bit display channel.
pub const DISPLAY_MAX_LEVEL: f64 = 255.0;

/// Bounded wait for the next frame, so a stop request is observed promptly.
pub const ACQUISITION_TIMEOUT: Duration = Duration::from_secs(1);

/// Terminator of every serial command and reply line.
pub const SERIAL_TERMINATOR: char = '\r';

/// Maximum bytes requested from the serial transport per poll.
pub const SERIAL_READ_CHUNK: usize = 256;

/// Timeout for a single serial read poll.
pub const SERIAL_READ_TIMEOUT: Duration = Duration::from_millis(50);

/// Offset between the EXP register and exposure counts (manual, section 5.12).
pub const EXP_OFFSET: f64 = 28.0;

/// Pixel clock used to convert exposure counts to seconds.
pub const PIXCLK_MAX: f64 = 20_750_000.0;

/// Number of records buffered before a timestamp log batch is written.
pub const TIMESTAMP_BATCH_SIZE: usize = 1000;

/// Default number of points kept by the scrolling summed-signal series.
pub const DEFAULT_SERIES_CAPACITY: usize = 100;

/// Default annotation color (yellow).
pub const DEFAULT_ANNOTATION_COLOR: [u8; 3] = [255, 255, 0];

/// Smallest default crosshair size, in pixels.
pub const MIN_CROSSHAIR_SIZE: f64 = 10.0;

/// Default crosshair size as a fraction of the smaller image dimension.
pub const CROSSHAIR_SIZE_FRACTION: f64 = 0.02;

/// Native sensor width of the synthetic camera.
pub const SYNTHETIC_SENSOR_WIDTH: u32 = 640;

/// Native sensor height of the synthetic camera.
pub const SYNTHETIC_SENSOR_HEIGHT: u32 = 512;

/// Number of log-spaced edges of the ADC histogram.
pub const HISTOGRAM_EDGES: usize = 1000;

/// Sample value the histogram normalizes by; the lowest edge is one count.
pub const HISTOGRAM_FULL_SCALE: f64 = 65_536.0;

/// Added to counts before taking log10 so empty bins stay finite.
pub const HISTOGRAM_LOG_OFFSET: f64 = 0.5;
