#[allow(dead_code)]
mod common;

use std::borrow::Cow;

use beamview_core::frame::FrameData;
use beamview_core::process::roi::{RoiExtractor, RoiParams};

#[test]
fn test_output_shape_is_clamped_box() {
    let frame = common::constant_raw(20, 30, 100);
    let roi = RoiParams::new(15, 10, 4.0, 2.0);
    let mut extractor = RoiExtractor::new();

    let out = extractor.apply(&frame, Some(&roi));
    assert_eq!(out.dim(), (12, 12));
    assert!(!out.data.is_raw());
    assert_eq!(common::samples(&out)[[6, 6]], 100.0);
}

#[test]
fn test_apply_is_repeatable() {
    let frame = common::ramp_raw(20, 30);
    let roi = RoiParams::new(12, 9, 5.0, 3.0);
    let mut extractor = RoiExtractor::new();

    let first = extractor.apply(&frame, Some(&roi)).into_owned();
    let second = extractor.apply(&frame, Some(&roi)).into_owned();
    assert_eq!(first.data, second.data);
}

#[test]
fn test_box_clamped_at_frame_edge() {
    let frame = common::constant_raw(20, 30, 1);
    let roi = RoiParams::new(0, 0, 4.0, 2.0);
    let out = RoiExtractor::new().apply(&frame, Some(&roi));
    assert_eq!(out.dim(), (6, 6));
}

#[test]
fn test_no_roi_passes_through() {
    let frame = common::constant_raw(4, 4, 9);
    let out = RoiExtractor::new().apply(&frame, None);
    assert!(matches!(out, Cow::Borrowed(_)));
    assert_eq!(out.data, frame.data);
}

#[test]
fn test_roi_outside_frame_passes_through() {
    let frame = common::constant_raw(10, 10, 9);
    let roi = RoiParams::new(-50, -50, 3.0, 1.0);
    let out = RoiExtractor::new().apply(&frame, Some(&roi));
    assert!(matches!(out, Cow::Borrowed(_)));
}

#[test]
fn test_zero_radius_passes_through() {
    let frame = common::constant_raw(10, 10, 9);
    let roi = RoiParams::new(5, 5, 0.0, 0.0);
    assert!(roi.bounding_box(frame.dim()).is_none());
    let out = RoiExtractor::new().apply(&frame, Some(&roi));
    assert!(matches!(out, Cow::Borrowed(_)));
}

#[test]
fn test_mask_zeroes_corners() {
    let frame = common::constant_float(40, 40, 50.0);
    let roi = RoiParams::new(20, 20, 8.0, 2.0);
    let out = RoiExtractor::new().apply(&frame, Some(&roi));
    let FrameData::Float(ref data) = out.data else {
        panic!("expected float output");
    };
    assert_eq!(data[[0, 0]], 0.0);
    assert_eq!(data[[10, 10]], 50.0);
}

#[test]
fn test_negative_parameters_clamped() {
    let roi = RoiParams::new(5, 5, -3.0, -1.0);
    assert_eq!(roi.radius, 0.0);
    assert_eq!(roi.taper, 0.0);
}

#[test]
fn test_metadata_preserved() {
    let frame = common::raw_with_sequence(20, 20, 10, 42);
    let roi = RoiParams::new(10, 10, 4.0, 0.0);
    let out = RoiExtractor::new().apply(&frame, Some(&roi));
    assert_eq!(out.metadata, frame.metadata);
}

#[test]
fn test_huge_radius_covers_frame() {
    let frame = common::constant_raw(20, 20, 5);
    let roi = RoiParams::new(10, 10, 1e19, 0.0);
    assert_eq!(roi.full_radius(), i64::MAX);

    let out = RoiExtractor::new().apply(&frame, Some(&roi));
    assert_eq!(out.dim(), (19, 19));
    assert!(common::samples(&out).iter().all(|&v| v == 5.0));
}

#[test]
fn test_extreme_center_does_not_overflow() {
    let roi = RoiParams::new(i64::MAX, i64::MIN, 1e19, 1e19);
    assert!(roi.bounding_box((20, 20)).is_none());
}

#[test]
fn test_full_radius_rounds_half_to_even() {
    assert_eq!(RoiParams::new(10, 10, 2.5, 0.0).full_radius(), 2);
    assert_eq!(RoiParams::new(10, 10, 3.0, 0.5).full_radius(), 4);
    let b = RoiParams::new(10, 10, 2.0, 0.5).bounding_box((20, 20)).unwrap();
    assert_eq!((b.height(), b.width()), (4, 4));
}
