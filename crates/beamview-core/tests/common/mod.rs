use beamview_core::frame::{Frame, FrameMetadata};
use ndarray::Array2;

/// Raw 12-bit frame filled with one value.
pub fn constant_raw(height: usize, width: usize, value: u16) -> Frame {
    Frame::raw(Array2::from_elem((height, width), value), 12)
}

/// Float frame filled with one value.
pub fn constant_float(height: usize, width: usize, value: f64) -> Frame {
    Frame::float(Array2::from_elem((height, width), value), 12)
}

/// Raw constant frame carrying an embedded counter value.
pub fn raw_with_sequence(height: usize, width: usize, value: u16, sequence: u32) -> Frame {
    constant_raw(height, width, value).with_metadata(FrameMetadata {
        frame_index: sequence as u64,
        sequence: Some(sequence),
        host_timestamp: Some(1_700_000_000.0 + sequence as f64 * 0.01),
    })
}

/// Raw frame whose value is `row * width + col`.
pub fn ramp_raw(height: usize, width: usize) -> Frame {
    Frame::raw(
        Array2::from_shape_fn((height, width), |(r, c)| (r * width + c) as u16),
        12,
    )
}

/// Float copy of a frame's samples.
pub fn samples(frame: &Frame) -> Array2<f64> {
    frame.data.to_f64()
}
