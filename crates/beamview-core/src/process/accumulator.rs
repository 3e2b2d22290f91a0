use ndarray::Array2;
use tracing::{debug, info};

use crate::consts::DEFAULT_ACCUMULATION_TARGET;
use crate::frame::{Frame, FrameData};

/// Running sum of frames.
///
/// Starts as wide integers so raw sensor frames sum exactly. Once a frame
/// that is not raw sensor data arrives, the sum is reinterpreted as floats
/// and stays that way.
#[derive(Clone, Debug, PartialEq)]
pub enum AccumulatorBuffer {
    Integer(Array2<i64>),
    Float(Array2<f64>),
}

impl AccumulatorBuffer {
    pub fn dim(&self) -> (usize, usize) {
        match self {
            Self::Integer(a) => a.dim(),
            Self::Float(a) => a.dim(),
        }
    }

    fn zeros_like_kind(&self, shape: (usize, usize)) -> Self {
        match self {
            Self::Integer(_) => Self::Integer(Array2::zeros(shape)),
            Self::Float(_) => Self::Float(Array2::zeros(shape)),
        }
    }

    fn upgrade_to_float(&mut self) {
        if let Self::Integer(a) = self {
            *self = Self::Float(a.mapv(|v| v as f64));
        }
    }

    fn add(&mut self, data: &FrameData) {
        match (self, data) {
            (Self::Integer(acc), FrameData::Raw(f)) => {
                acc.zip_mut_with(f, |a, &v| *a += v as i64);
            }
            (Self::Float(acc), FrameData::Raw(f)) => {
                acc.zip_mut_with(f, |a, &v| *a += v as f64);
            }
            (Self::Float(acc), FrameData::Float(f)) => {
                *acc += f;
            }
            (Self::Integer(acc), FrameData::Float(f)) => {
                // Callers upgrade before adding float data; fall back to rounding.
                acc.zip_mut_with(f, |a, &v| *a += v.round() as i64);
            }
        }
    }

    fn mean(&self, count: usize) -> Array2<f64> {
        let n = count as f64;
        match self {
            Self::Integer(a) => a.mapv(|v| v as f64 / n),
            Self::Float(a) => a.mapv(|v| v / n),
        }
    }
}

/// Averages every `target` frames into one.
#[derive(Debug)]
pub struct FrameAccumulator {
    buffer: Option<AccumulatorBuffer>,
    count: usize,
    target: usize,
    average: Option<Array2<f64>>,
    completed: u64,
}

impl FrameAccumulator {
    /// `target` is clamped to at least 1.
    pub fn new(target: usize) -> Self {
        Self {
            buffer: None,
            count: 0,
            target: target.max(1),
            average: None,
            completed: 0,
        }
    }

    /// Change the number of frames per average. Takes effect on the next
    /// `add`; if the current count already reaches the new target, that
    /// call completes the cycle.
    pub fn set_target(&mut self, target: usize) {
        self.target = target.max(1);
    }

    pub fn target(&self) -> usize {
        self.target
    }

    /// Frames summed in the current cycle.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Number of averages produced so far.
    pub fn completed(&self) -> u64 {
        self.completed
    }

    pub fn is_float(&self) -> bool {
        matches!(self.buffer, Some(AccumulatorBuffer::Float(_)))
    }

    pub fn buffer(&self) -> Option<&AccumulatorBuffer> {
        self.buffer.as_ref()
    }

    /// Add a frame. Returns true when this frame completed an average,
    /// which is then available from [`average`](Self::average).
    pub fn add(&mut self, frame: &Frame) -> bool {
        let shape = frame.dim();

        let needs_reset = match &self.buffer {
            None => true,
            Some(buf) => buf.dim() != shape || self.count == 0,
        };
        if needs_reset {
            self.restart(shape);
        }

        let Some(buffer) = self.buffer.as_mut() else {
            return false;
        };
        if !frame.data.is_raw() && matches!(buffer, AccumulatorBuffer::Integer(_)) {
            info!("Non-raw frame received, switching accumulator to floating point");
            buffer.upgrade_to_float();
        }

        buffer.add(&frame.data);
        self.count += 1;

        if self.count < self.target {
            return false;
        }

        self.average = Some(buffer.mean(self.count));
        self.completed += 1;
        debug!(frames = self.count, completed = self.completed, "Average ready");
        self.restart(shape);
        true
    }

    /// Most recently completed average.
    pub fn average(&self) -> Option<&Array2<f64>> {
        self.average.as_ref()
    }

    /// Drop everything, including the float representation and the last
    /// average (e.g. after reconnecting).
    pub fn reset(&mut self) {
        self.buffer = None;
        self.count = 0;
        self.average = None;
    }

    /// Throw away the partial cycle. The last average and the sum's
    /// representation are kept.
    pub fn discard_partial(&mut self) {
        if let Some(shape) = self.buffer.as_ref().map(AccumulatorBuffer::dim) {
            self.restart(shape);
        }
    }

    /// Zero the sum for a new cycle, keeping the current representation.
    fn restart(&mut self, shape: (usize, usize)) {
        self.buffer = Some(match &self.buffer {
            Some(buf) => buf.zeros_like_kind(shape),
            None => AccumulatorBuffer::Integer(Array2::zeros(shape)),
        });
        self.count = 0;
    }
}

impl Default for FrameAccumulator {
    fn default() -> Self {
        Self::new(DEFAULT_ACCUMULATION_TARGET)
    }
}
