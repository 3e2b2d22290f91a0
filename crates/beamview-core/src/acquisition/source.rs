use std::time::{Duration, SystemTime, UNIX_EPOCH};

use ndarray::Array2;
use tracing::{debug, info};

use crate::consts::{SENSOR_BIT_DEPTH, SEQUENCE_BIT_WIDTH, SYNTHETIC_SENSOR_HEIGHT, SYNTHETIC_SENSOR_WIDTH};
use crate::error::{BeamviewError, Result};
use crate::frame::{Frame, FrameMetadata};

/// A frame copied out of the driver's buffer, owned by the consumer.
#[derive(Clone, Debug)]
pub struct RawFrame {
    pub pixels: Array2<u16>,
    /// Counter value the camera embedded in the frame.
    pub sequence: u32,
    /// Host time of arrival, seconds since the Unix epoch.
    pub host_timestamp: f64,
}

impl RawFrame {
    pub fn new(pixels: Array2<u16>, sequence: u32) -> Self {
        Self {
            pixels,
            sequence,
            host_timestamp: host_now(),
        }
    }

    pub fn into_frame(self, frame_index: u64, bit_depth: u8) -> Frame {
        Frame::raw(self.pixels, bit_depth).with_metadata(FrameMetadata {
            frame_index,
            sequence: Some(self.sequence),
            host_timestamp: Some(self.host_timestamp),
        })
    }
}

/// Seconds since the Unix epoch.
pub fn host_now() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

/// Native pixel bounds of a sensor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SensorBounds {
    pub width: u32,
    pub height: u32,
}

/// Readout window, inclusive pixel coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResolutionRequest {
    pub x1: i64,
    pub y1: i64,
    pub x2: i64,
    pub y2: i64,
}

impl ResolutionRequest {
    /// The whole sensor.
    pub fn full(sensor: SensorBounds) -> Self {
        Self {
            x1: 0,
            y1: 0,
            x2: sensor.width as i64 - 1,
            y2: sensor.height as i64 - 1,
        }
    }

    pub fn width(&self) -> i64 {
        self.x2 - self.x1 + 1
    }

    pub fn height(&self) -> i64 {
        self.y2 - self.y1 + 1
    }

    /// Snap the window to what the sensor accepts: the first corner is
    /// rounded up to even coordinates, the second up to odd ones, and both
    /// are clamped to the sensor. Returns `None` when nothing valid is left.
    pub fn negotiate(&self, sensor: SensorBounds) -> Option<ResolutionRequest> {
        let (x1, x2) = snap_axis(self.x1, self.x2, sensor.width)?;
        let (y1, y2) = snap_axis(self.y1, self.y2, sensor.height)?;
        Some(ResolutionRequest { x1, y1, x2, y2 })
    }
}

fn snap_axis(lo: i64, hi: i64, native: u32) -> Option<(i64, i64)> {
    let native = native as i64;
    // Largest odd coordinate inside the sensor.
    let max_hi = if (native - 1) % 2 == 1 { native - 1 } else { native - 2 };
    if max_hi < 1 {
        return None;
    }

    let lo = lo.max(0);
    let lo = lo + (lo & 1);
    let hi = (hi | 1).min(max_hi);

    let size = hi - lo + 1;
    if size <= 0 || size > native {
        return None;
    }
    Some((lo, hi))
}

/// Frame-grabber driver seen from the pipeline.
pub trait AcquisitionSource: Send {
    /// Unique ids of every reachable device.
    fn list_devices(&mut self) -> Result<Vec<String>>;

    fn connect(&mut self, device_id: &str) -> Result<()>;

    fn disconnect(&mut self) -> Result<()>;

    fn is_connected(&self) -> bool;

    fn sensor(&self) -> SensorBounds;

    /// Start streaming with the negotiated window. Returns the applied
    /// window, or `None` if the request was rejected and the previous
    /// settings are kept.
    fn open_stream(&mut self, request: ResolutionRequest) -> Result<Option<ResolutionRequest>>;

    fn close_stream(&mut self) -> Result<()>;

    /// Block up to `timeout` for the next frame. `Ok(None)` is a timeout.
    fn next_frame(&mut self, timeout: Duration) -> Result<Option<RawFrame>>;

    /// Significant bits per sample.
    fn bit_depth(&self) -> u8 {
        SENSOR_BIT_DEPTH
    }
}

/// Test-pattern camera: a dark field with a bright block sweeping across
/// the top rows, and a wrapping 12-bit frame counter.
#[derive(Debug)]
pub struct SyntheticSource {
    sensor: SensorBounds,
    window: ResolutionRequest,
    connected: bool,
    streaming: bool,
    counter: u32,
    iteration: usize,
    background: u16,
    signal: u16,
    block_size: usize,
    frame_interval: Duration,
    drop_every: Option<u32>,
    fail_after: Option<u64>,
    delivered: u64,
}

pub const SYNTHETIC_DEVICE_ID: &str = "synthetic:0";

impl SyntheticSource {
    pub fn new(sensor: SensorBounds) -> Self {
        Self {
            sensor,
            window: ResolutionRequest::full(sensor),
            connected: false,
            streaming: false,
            counter: 0,
            iteration: 0,
            background: 100,
            signal: 2000,
            block_size: 10,
            frame_interval: Duration::ZERO,
            drop_every: None,
            fail_after: None,
            delivered: 0,
        }
    }

    /// Sleep between frames to emulate a frame rate.
    pub fn with_frame_interval(mut self, interval: Duration) -> Self {
        self.frame_interval = interval;
        self
    }

    /// Skip one counter value every `n` frames, as if the driver dropped it.
    pub fn with_drop_every(mut self, n: u32) -> Self {
        self.drop_every = (n > 0).then_some(n);
        self
    }

    /// Report a driver error after `n` frames.
    pub fn with_fail_after(mut self, n: u64) -> Self {
        self.fail_after = Some(n);
        self
    }

    pub fn with_levels(mut self, background: u16, signal: u16) -> Self {
        self.background = background;
        self.signal = signal;
        self
    }

    pub fn window(&self) -> ResolutionRequest {
        self.window
    }

    fn render(&mut self) -> Array2<u16> {
        let h = self.window.height() as usize;
        let w = self.window.width() as usize;
        let mut data = Array2::<u16>::from_elem((h, w), self.background);

        let start = self.iteration % w.max(1);
        let rows = self.block_size.min(h);
        let end = (start + self.block_size).min(w);
        data.slice_mut(ndarray::s![0..rows, start..end])
            .fill(self.signal);
        self.iteration += self.block_size;
        data
    }
}

impl Default for SyntheticSource {
    fn default() -> Self {
        Self::new(SensorBounds {
            width: SYNTHETIC_SENSOR_WIDTH,
            height: SYNTHETIC_SENSOR_HEIGHT,
        })
    }
}

impl AcquisitionSource for SyntheticSource {
    fn list_devices(&mut self) -> Result<Vec<String>> {
        Ok(vec![SYNTHETIC_DEVICE_ID.to_string()])
    }

    fn connect(&mut self, device_id: &str) -> Result<()> {
        if device_id != SYNTHETIC_DEVICE_ID {
            return Err(BeamviewError::Device(format!("no device {device_id}")));
        }
        self.connected = true;
        info!(device_id, "Connected");
        Ok(())
    }

    fn disconnect(&mut self) -> Result<()> {
        self.streaming = false;
        self.connected = false;
        info!("Disconnected");
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn sensor(&self) -> SensorBounds {
        self.sensor
    }

    fn open_stream(&mut self, request: ResolutionRequest) -> Result<Option<ResolutionRequest>> {
        if !self.connected {
            return Err(BeamviewError::NotConnected);
        }
        let Some(window) = request.negotiate(self.sensor) else {
            debug!(?request, "Resolution request rejected");
            return Ok(None);
        };
        self.window = window;
        self.streaming = true;
        info!(
            width = window.width(),
            height = window.height(),
            "Stream opened"
        );
        Ok(Some(window))
    }

    fn close_stream(&mut self) -> Result<()> {
        self.streaming = false;
        Ok(())
    }

    fn next_frame(&mut self, timeout: Duration) -> Result<Option<RawFrame>> {
        if !self.streaming {
            return Err(BeamviewError::NotConnected);
        }
        if self.fail_after.is_some_and(|n| self.delivered >= n) {
            return Err(BeamviewError::Device("synthetic driver failure".into()));
        }
        if self.frame_interval > timeout {
            std::thread::sleep(timeout);
            return Ok(None);
        }
        if !self.frame_interval.is_zero() {
            std::thread::sleep(self.frame_interval);
        }

        let modulus = 1u32 << SEQUENCE_BIT_WIDTH;
        if self
            .drop_every
            .is_some_and(|n| self.delivered > 0 && self.delivered % n as u64 == 0)
        {
            self.counter = (self.counter + 1) % modulus;
        }

        let pixels = self.render();
        let frame = RawFrame::new(pixels, self.counter);
        self.counter = (self.counter + 1) % modulus;
        self.delivered += 1;
        Ok(Some(frame))
    }
}
