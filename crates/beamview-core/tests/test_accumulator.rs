#[allow(dead_code)]
mod common;

use beamview_core::process::accumulator::{AccumulatorBuffer, FrameAccumulator};

#[test]
fn test_exact_average_of_constant_frames() {
    let mut acc = FrameAccumulator::new(4);
    let frame = common::constant_raw(8, 8, 7);
    for _ in 0..3 {
        assert!(!acc.add(&frame));
    }
    assert!(acc.average().is_none());
    assert!(acc.add(&frame));
    let avg = acc.average().unwrap();
    assert!(avg.iter().all(|&v| v == 7.0));
}

#[test]
fn test_next_add_starts_new_cycle() {
    let mut acc = FrameAccumulator::new(2);
    let frame = common::constant_raw(4, 4, 10);
    acc.add(&frame);
    acc.add(&frame);
    assert_eq!(acc.count(), 0);
    assert_eq!(acc.completed(), 1);

    acc.add(&common::constant_raw(4, 4, 20));
    assert_eq!(acc.count(), 1);
    assert!(acc.average().unwrap().iter().all(|&v| v == 10.0));
}

#[test]
fn test_full_scale_sum_does_not_wrap() {
    let mut acc = FrameAccumulator::new(1000);
    let frame = common::constant_raw(2, 2, u16::MAX);
    for _ in 0..1000 {
        acc.add(&frame);
    }
    assert!(acc.average().unwrap().iter().all(|&v| v == 65535.0));
}

#[test]
fn test_float_frame_switches_representation() {
    let mut acc = FrameAccumulator::new(2);
    acc.add(&common::constant_raw(3, 3, 10));
    assert!(!acc.is_float());
    assert!(matches!(acc.buffer(), Some(AccumulatorBuffer::Integer(_))));

    acc.add(&common::constant_float(3, 3, 20.5));
    let avg = acc.average().unwrap();
    assert!(avg.iter().all(|&v| (v - 15.25).abs() < 1e-12));
    assert!(acc.is_float());
}

#[test]
fn test_float_representation_survives_cycle() {
    let mut acc = FrameAccumulator::new(1);
    acc.add(&common::constant_float(2, 2, 1.5));
    acc.add(&common::constant_raw(2, 2, 3));
    assert!(acc.is_float());
    assert_eq!(acc.average().unwrap()[[0, 0]], 3.0);

    acc.reset();
    assert!(!acc.is_float());
    assert!(acc.average().is_none());
}

#[test]
fn test_shape_change_restarts_cycle() {
    let mut acc = FrameAccumulator::new(3);
    acc.add(&common::constant_raw(4, 4, 1));
    acc.add(&common::constant_raw(4, 4, 1));
    acc.add(&common::constant_raw(2, 2, 5));
    assert_eq!(acc.count(), 1);
    assert_eq!(acc.buffer().unwrap().dim(), (2, 2));
}

#[test]
fn test_target_clamped_to_one() {
    let mut acc = FrameAccumulator::new(0);
    assert_eq!(acc.target(), 1);
    assert!(acc.add(&common::constant_raw(2, 2, 4)));
}

#[test]
fn test_lowering_target_completes_on_next_add() {
    let mut acc = FrameAccumulator::new(5);
    let frame = common::constant_raw(2, 2, 6);
    acc.add(&frame);
    acc.add(&frame);
    acc.set_target(2);
    assert!(acc.add(&frame));
    assert_eq!(acc.average().unwrap()[[1, 1]], 6.0);
}

#[test]
fn test_discard_partial_keeps_last_average() {
    let mut acc = FrameAccumulator::new(2);
    acc.add(&common::constant_float(2, 2, 4.0));
    acc.add(&common::constant_float(2, 2, 6.0));
    acc.add(&common::constant_raw(2, 2, 100));
    assert_eq!(acc.count(), 1);

    acc.discard_partial();
    assert_eq!(acc.count(), 0);
    assert!(acc.is_float());
    assert_eq!(acc.average().unwrap()[[1, 1]], 5.0);

    acc.add(&common::constant_raw(2, 2, 8));
    assert!(acc.add(&common::constant_raw(2, 2, 8)));
    assert_eq!(acc.average().unwrap()[[0, 0]], 8.0);
}
